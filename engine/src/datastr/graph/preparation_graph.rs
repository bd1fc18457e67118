//! The graph which changes during contraction: a road graph, the levels assigned so far and the shortcuts inserted so far.

use super::*;

#[derive(Debug)]
pub struct PreparationGraph<'a> {
    road: &'a RoadGraph,
    // nodes which are not contracted yet have level `num_nodes`
    levels: Vec<u32>,
    out_shortcuts: Vec<Vec<ChArc>>,
    num_shortcuts: usize,
}

impl<'a> PreparationGraph<'a> {
    pub fn new(road: &'a RoadGraph) -> PreparationGraph<'a> {
        PreparationGraph {
            road,
            levels: vec![road.num_nodes() as u32; road.num_nodes()],
            out_shortcuts: vec![Vec::new(); road.num_nodes()],
            num_shortcuts: 0,
        }
    }

    pub fn road(&self) -> &'a RoadGraph {
        self.road
    }

    /// Mark `node` as contracted.
    pub fn set_level(&mut self, node: NodeId, level: u32) {
        assert!(level < self.max_level(), "level {} reserved for uncontracted nodes", level);
        self.levels[node as usize] = level;
    }

    pub fn level(&self, node: NodeId) -> Option<u32> {
        let level = self.levels[node as usize];
        if level == self.max_level() {
            None
        } else {
            Some(level)
        }
    }

    fn max_level(&self) -> u32 {
        self.road.num_nodes() as u32
    }

    pub fn num_shortcuts(&self) -> usize {
        self.num_shortcuts
    }

    /// Insert a shortcut from `from` to `to` which leaves `from` on `first_orig_edge` and arrives at `to` on `last_orig_edge`.
    /// Returns the id of the new shortcut.
    pub fn add_shortcut(&mut self, from: NodeId, to: NodeId, weight: Weight, first_orig_edge: EdgeId, last_orig_edge: EdgeId) -> EdgeId {
        assert!(self.road.leaves(first_orig_edge, from), "shortcut does not start on an edge leaving its tail");
        assert!(self.road.enters(last_orig_edge, to), "shortcut does not end on an edge entering its head");
        assert!(weight >= 0.0 && weight < INFINITY, "invalid shortcut weight {}", weight);

        let edge = (self.road.num_segments() + self.num_shortcuts) as EdgeId;
        self.out_shortcuts[from as usize].push(ChArc {
            edge,
            head: to,
            first_orig_edge,
            last_orig_edge,
            weight,
        });
        self.num_shortcuts += 1;
        edge
    }
}

impl<'g> EdgeBasedChGraph for PreparationGraph<'g> {
    type OutArcs<'a> = OutArcs<'a> where Self: 'a;
    type OrigInEdges<'a> = road_graph::OrigEdges<'a> where Self: 'a;

    fn num_nodes(&self) -> usize {
        self.road.num_nodes()
    }

    fn num_original_edges(&self) -> usize {
        self.road.num_segments()
    }

    fn out_arcs(&self, node: NodeId) -> OutArcs<'_> {
        OutArcs {
            road: self.road,
            node,
            incident: self.road.incident_edges(node).iter(),
            pending_loop: None,
            shortcuts: self.out_shortcuts[node as usize].iter(),
        }
    }

    fn original_in_edges(&self, node: NodeId) -> road_graph::OrigEdges<'_> {
        self.road.original_in_edges(node)
    }

    fn is_contracted(&self, node: NodeId) -> bool {
        self.levels[node as usize] != self.max_level()
    }

    fn turn_weight(&self, in_edge: EdgeId, via: NodeId, out_edge: EdgeId) -> Weight {
        self.road.turn_weight(in_edge, via, out_edge)
    }

    fn edge_key(&self, edge: EdgeId, adj_node: NodeId) -> EdgeKey {
        self.road.edge_key(edge, adj_node)
    }
}

/// Original edges leaving a node followed by the shortcuts leaving it.
/// Loops which can be traversed both ways are yielded once per direction.
#[derive(Debug, Clone)]
pub struct OutArcs<'a> {
    road: &'a RoadGraph,
    node: NodeId,
    incident: std::slice::Iter<'a, EdgeId>,
    pending_loop: Option<ChArc>,
    shortcuts: std::slice::Iter<'a, ChArc>,
}

impl<'a> Iterator for OutArcs<'a> {
    type Item = ChArc;

    fn next(&mut self) -> Option<ChArc> {
        if let Some(arc) = self.pending_loop.take() {
            return Some(arc);
        }

        for &edge in self.incident.by_ref() {
            let segment = self.road.segment(edge);
            let arc = |head, weight| ChArc {
                edge,
                head,
                first_orig_edge: edge,
                last_orig_edge: edge,
                weight,
            };

            if segment.base == segment.adj {
                match (segment.forward < INFINITY, segment.backward < INFINITY) {
                    (true, true) => {
                        self.pending_loop = Some(arc(self.node, segment.backward));
                        return Some(arc(self.node, segment.forward));
                    }
                    (true, false) => return Some(arc(self.node, segment.forward)),
                    (false, true) => return Some(arc(self.node, segment.backward)),
                    (false, false) => continue,
                }
            }

            if segment.base == self.node && segment.forward < INFINITY {
                return Some(arc(segment.adj, segment.forward));
            }
            if segment.adj == self.node && segment.backward < INFINITY {
                return Some(arc(segment.base, segment.backward));
            }
        }

        self.shortcuts.next().copied()
    }
}
