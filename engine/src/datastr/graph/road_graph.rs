//! Road networks as they are before preparation: original edges and turn costs.
//!
//! Original edges are stored once as segments between a base and an adjacent node.
//! A segment may be traversable in both directions, each with its own weight.
//! The incidence lists are kept as an adjacency array: `incident[first_out[x]..first_out[x+1]]`
//! contains the ids of all segments touching `x`, loops are listed once.

use super::*;
use crate::io::*;

/// An original edge. Directions which may not be used have an `INFINITY` weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub base: NodeId,
    pub adj: NodeId,
    /// Weight for traveling from `base` to `adj`
    pub forward: Weight,
    /// Weight for traveling from `adj` to `base`
    pub backward: Weight,
}

impl Segment {
    pub fn one_way(base: NodeId, adj: NodeId, weight: Weight) -> Segment {
        Segment {
            base,
            adj,
            forward: weight,
            backward: INFINITY,
        }
    }

    pub fn two_way(base: NodeId, adj: NodeId, weight: Weight) -> Segment {
        Segment {
            base,
            adj,
            forward: weight,
            backward: weight,
        }
    }
}

/// Costs for turning from one original edge onto another.
/// `INFINITY` weights are turn restrictions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    pub from: EdgeId,
    pub via: NodeId,
    pub to: EdgeId,
    pub weight: Weight,
}

impl Turn {
    fn key(&self) -> (EdgeId, NodeId, EdgeId) {
        (self.from, self.via, self.to)
    }
}

#[derive(Debug, Clone)]
pub struct RoadGraph {
    segments: Vec<Segment>,
    first_out: Vec<EdgeId>,
    incident: Vec<EdgeId>,
    // sorted by (from, via, to), turns not contained are free
    turns: Vec<Turn>,
}

impl RoadGraph {
    /// Create a graph without turn costs.
    pub fn new(num_nodes: usize, segments: Vec<Segment>) -> RoadGraph {
        assert!(segments.len() < EdgeId::MAX as usize / 2, "too many segments for edge keys");
        let mut degrees = vec![0; num_nodes];
        for s in &segments {
            assert!((s.base as usize) < num_nodes && (s.adj as usize) < num_nodes, "segment with unknown node");
            assert!(s.forward >= 0.0 && s.backward >= 0.0, "negative segment weight");
            degrees[s.base as usize] += 1;
            if s.adj != s.base {
                degrees[s.adj as usize] += 1;
            }
        }
        let first_out: Vec<EdgeId> = degrees_to_first_out(degrees.into_iter()).collect();

        let mut next_slot: Vec<usize> = first_out[..num_nodes].iter().map(|&idx| idx as usize).collect();
        let mut incident = vec![0; first_out[num_nodes] as usize];
        for (edge, s) in segments.iter().enumerate() {
            incident[next_slot[s.base as usize]] = edge as EdgeId;
            next_slot[s.base as usize] += 1;
            if s.adj != s.base {
                incident[next_slot[s.adj as usize]] = edge as EdgeId;
                next_slot[s.adj as usize] += 1;
            }
        }

        RoadGraph {
            segments,
            first_out,
            incident,
            turns: Vec::new(),
        }
    }

    /// Replace the turn costs of this graph.
    /// For duplicate turns the first one in the given order wins.
    pub fn with_turns(mut self, mut turns: Vec<Turn>) -> RoadGraph {
        for turn in &turns {
            assert!(self.enters(turn.from, turn.via), "turn from edge which does not enter the via node");
            assert!(self.leaves(turn.to, turn.via), "turn onto edge which does not leave the via node");
            assert!(turn.weight >= 0.0, "negative turn costs");
        }
        turns.sort_by_key(Turn::key);
        turns.dedup_by_key(|turn| turn.key());
        self.turns = turns;
        self
    }

    /// Build a graph from the RoutingKit representation.
    /// Every arc becomes a one way segment. Turns between the given arcs are forbidden, as are u-turns onto the arc back to the tail.
    pub fn from_routingkit(
        first_out: &[EdgeId],
        head: &[NodeId],
        travel_time: &[u32],
        forbidden_turn_from_arc: &[EdgeId],
        forbidden_turn_to_arc: &[EdgeId],
    ) -> RoadGraph {
        assert_eq!(first_out.first(), Some(&0));
        assert_eq!(first_out.last().map(|&idx| idx as usize), Some(head.len()));
        assert_eq!(head.len(), travel_time.len());
        assert_eq!(forbidden_turn_from_arc.len(), forbidden_turn_to_arc.len());

        let num_nodes = first_out.len() - 1;
        let mut tail = Vec::with_capacity(head.len());
        for node in 0..num_nodes {
            for _ in first_out[node]..first_out[node + 1] {
                tail.push(node as NodeId);
            }
        }

        let segments = tail
            .iter()
            .zip(head.iter())
            .zip(travel_time.iter())
            .map(|((&tail, &head), &tt)| Segment::one_way(tail, head, tt as Weight))
            .collect();

        let mut turns = Vec::new();
        for (&from, &to) in forbidden_turn_from_arc.iter().zip(forbidden_turn_to_arc.iter()) {
            let via = head[from as usize];
            assert_eq!(tail[to as usize], via, "forbidden turn between arcs which do not meet");
            turns.push(Turn { from, via, to, weight: INFINITY });
        }
        for from in 0..head.len() {
            let via = head[from];
            for to in first_out[via as usize]..first_out[via as usize + 1] {
                if head[to as usize] == tail[from] {
                    turns.push(Turn {
                        from: from as EdgeId,
                        via,
                        to,
                        weight: INFINITY,
                    });
                }
            }
        }

        RoadGraph::new(num_nodes, segments).with_turns(turns)
    }

    pub fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn num_turns(&self) -> usize {
        self.turns.len()
    }

    pub fn segment(&self, edge: EdgeId) -> &Segment {
        &self.segments[edge as usize]
    }

    /// Ids of all segments touching `node`
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        let node = node as usize;
        &self.incident[self.first_out[node] as usize..self.first_out[node + 1] as usize]
    }

    /// The node at the other end of `edge`, seen from `node`
    pub fn other_node(&self, edge: EdgeId, node: NodeId) -> NodeId {
        let s = self.segment(edge);
        debug_assert!(s.base == node || s.adj == node);
        if s.base == node {
            s.adj
        } else {
            s.base
        }
    }

    /// Can `node` be entered through `edge`?
    pub fn enters(&self, edge: EdgeId, node: NodeId) -> bool {
        let s = self.segment(edge);
        (s.adj == node && s.forward < INFINITY) || (s.base == node && s.backward < INFINITY)
    }

    /// Can `node` be left through `edge`?
    pub fn leaves(&self, edge: EdgeId, node: NodeId) -> bool {
        let s = self.segment(edge);
        (s.base == node && s.forward < INFINITY) || (s.adj == node && s.backward < INFINITY)
    }

    /// All original edges through which `node` can be entered
    pub fn original_in_edges(&self, node: NodeId) -> OrigEdges<'_> {
        OrigEdges {
            graph: self,
            node,
            incident: self.incident_edges(node).iter(),
            incoming: true,
        }
    }

    /// All original edges through which `node` can be left
    pub fn original_out_edges(&self, node: NodeId) -> OrigEdges<'_> {
        OrigEdges {
            graph: self,
            node,
            incident: self.incident_edges(node).iter(),
            incoming: false,
        }
    }

    pub fn turn_weight(&self, in_edge: EdgeId, via: NodeId, out_edge: EdgeId) -> Weight {
        match self.turns.binary_search_by_key(&(in_edge, via, out_edge), Turn::key) {
            Ok(idx) => self.turns[idx].weight,
            Err(_) => 0.0,
        }
    }

    /// Edge key for arriving at `adj_node` through `edge`.
    /// Both directions of a loop share a key.
    pub fn edge_key(&self, edge: EdgeId, adj_node: NodeId) -> EdgeKey {
        let s = self.segment(edge);
        assert!(s.adj == adj_node || s.base == adj_node, "edge {} does not touch node {}", edge, adj_node);
        edge_key(edge, s.adj == adj_node)
    }
}

/// Graphs in the RoutingKit directory format with `travel_time` as weights.
/// Turn restrictions are optional.
impl Reconstruct for RoadGraph {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        let first_out: Vec<EdgeId> = loader.load("first_out")?;
        let head: Vec<NodeId> = loader.load("head")?;
        let travel_time: Vec<u32> = loader.load("travel_time")?;
        let forbidden_turn_from_arc: Vec<EdgeId> = loader.load_optional("forbidden_turn_from_arc")?;
        let forbidden_turn_to_arc: Vec<EdgeId> = loader.load_optional("forbidden_turn_to_arc")?;
        Ok(RoadGraph::from_routingkit(
            &first_out,
            &head,
            &travel_time,
            &forbidden_turn_from_arc,
            &forbidden_turn_to_arc,
        ))
    }
}

/// Iterator over original edges entering or leaving a node.
#[derive(Debug, Clone)]
pub struct OrigEdges<'a> {
    graph: &'a RoadGraph,
    node: NodeId,
    incident: std::slice::Iter<'a, EdgeId>,
    incoming: bool,
}

impl<'a> Iterator for OrigEdges<'a> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        for &edge in self.incident.by_ref() {
            let usable = if self.incoming {
                self.graph.enters(edge, self.node)
            } else {
                self.graph.leaves(edge, self.node)
            };
            if usable {
                return Some(edge);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //
    //      0 ==== 1 ----> 2
    //      ^              |
    //      +--------------+
    //
    fn graph() -> RoadGraph {
        RoadGraph::new(
            3,
            vec![Segment::two_way(0, 1, 2.0), Segment::one_way(1, 2, 1.0), Segment::one_way(2, 0, 4.0)],
        )
    }

    #[test]
    fn incidence_and_directions() {
        let graph = graph();
        assert_eq!(graph.incident_edges(0), &[0, 2]);
        assert_eq!(graph.incident_edges(1), &[0, 1]);
        assert_eq!(graph.original_in_edges(0).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(graph.original_out_edges(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(graph.original_in_edges(2).collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.original_out_edges(2).collect::<Vec<_>>(), vec![2]);
        assert_eq!(graph.other_node(0, 1), 0);
    }

    #[test]
    fn edge_keys_distinguish_directions() {
        let graph = graph();
        assert_eq!(graph.edge_key(0, 1), 0);
        assert_eq!(graph.edge_key(0, 0), 1);
        assert_eq!(graph.edge_key(2, 0), 4);
        assert_eq!(graph.edge_key(2, 2), 5);
    }

    #[test]
    fn turn_costs_default_to_zero() {
        let graph = graph().with_turns(vec![
            Turn { from: 0, via: 1, to: 1, weight: 3.0 },
            Turn { from: 1, via: 2, to: 2, weight: INFINITY },
            Turn { from: 0, via: 1, to: 1, weight: 7.0 },
        ]);
        assert_eq!(graph.num_turns(), 2);
        assert_eq!(graph.turn_weight(0, 1, 1), 3.0);
        assert_eq!(graph.turn_weight(1, 2, 2), INFINITY);
        assert_eq!(graph.turn_weight(2, 0, 0), 0.0);
    }

    #[test]
    #[should_panic]
    fn turns_have_to_meet_at_via_node() {
        graph().with_turns(vec![Turn { from: 1, via: 0, to: 0, weight: 1.0 }]);
    }

    #[test]
    fn routingkit_conversion_forbids_u_turns() {
        // 0 <-> 1 -> 2
        let first_out = [0, 1, 3, 3];
        let head = [1, 0, 2];
        let travel_time = [5, 5, 2];
        let graph = RoadGraph::from_routingkit(&first_out, &head, &travel_time, &[0], &[2]);

        assert_eq!(graph.num_segments(), 3);
        assert_eq!(graph.segment(1), &Segment::one_way(1, 0, 5.0));
        assert_eq!(graph.turn_weight(0, 1, 1), INFINITY);
        assert_eq!(graph.turn_weight(0, 1, 2), INFINITY);
        assert_eq!(graph.turn_weight(1, 0, 0), INFINITY);
    }

    #[test]
    fn reconstruct_from_routingkit_dir() {
        let dir = std::env::temp_dir().join(format!("edge_ch_witness_road_graph_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        vec![0u32, 1, 2, 2].write_to(&dir.join("first_out")).unwrap();
        vec![1u32, 2].write_to(&dir.join("head")).unwrap();
        vec![3u32, 4].write_to(&dir.join("travel_time")).unwrap();

        let graph = RoadGraph::reconstruct_from(&dir).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_turns(), 0);
        assert_eq!(graph.segment(1), &Segment::one_way(1, 2, 4.0));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
