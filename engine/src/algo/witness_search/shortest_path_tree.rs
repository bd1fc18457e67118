//! Flat storage for the shortest path tree of a witness search.
//!
//! All arrays are indexed by edge key and allocated once for the whole graph.
//! Every key which gets discovered is logged, so resetting only touches the entries of the last search.

use crate::datastr::graph::*;
use crate::util::in_range_option::InRangeOption;

/// Predecessor of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Unset,
    /// Entry was reached directly from the source edge, the index refers to the root table of the search.
    Root(usize),
    Entry(EdgeKey),
}

#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    weights: Vec<Weight>,
    edges: Vec<InRangeOption<EdgeId>>,
    inc_edges: Vec<InRangeOption<EdgeId>>,
    adj_nodes: Vec<InRangeOption<NodeId>>,
    parents: Vec<Parent>,
    is_potential_bridge_path: Vec<bool>,
    changed: Vec<EdgeKey>,
    // flagged entries which have not been settled yet
    num_potential_bridge_paths: usize,
}

impl ShortestPathTree {
    pub fn new(num_keys: usize) -> ShortestPathTree {
        ShortestPathTree {
            weights: vec![INFINITY; num_keys],
            edges: vec![InRangeOption::NONE; num_keys],
            inc_edges: vec![InRangeOption::NONE; num_keys],
            adj_nodes: vec![InRangeOption::NONE; num_keys],
            parents: vec![Parent::Unset; num_keys],
            is_potential_bridge_path: vec![false; num_keys],
            changed: Vec::new(),
            num_potential_bridge_paths: 0,
        }
    }

    pub fn num_keys(&self) -> usize {
        self.weights.len()
    }

    pub fn is_discovered(&self, key: EdgeKey) -> bool {
        self.edges[key].is_some()
    }

    /// Add an entry for an undiscovered key, arriving through `arc`.
    pub fn insert(&mut self, key: EdgeKey, arc: &ChArc, weight: Weight, parent: Parent, is_potential_bridge_path: bool) {
        assert!(!self.is_discovered(key), "edge key {} inserted twice", key);
        self.weights[key] = weight;
        self.edges[key] = InRangeOption::some(arc.edge);
        self.inc_edges[key] = InRangeOption::some(arc.last_orig_edge);
        self.adj_nodes[key] = InRangeOption::some(arc.head);
        self.parents[key] = parent;
        self.is_potential_bridge_path[key] = is_potential_bridge_path;
        if is_potential_bridge_path {
            self.num_potential_bridge_paths += 1;
        }
        self.changed.push(key);
    }

    /// Relax a discovered key. The new weight has to be strictly better.
    pub fn improve(&mut self, key: EdgeKey, arc: &ChArc, weight: Weight, parent: Parent, is_potential_bridge_path: bool) {
        assert!(self.is_discovered(key), "edge key {} improved before insertion", key);
        assert!(weight < self.weights[key]);
        debug_assert_eq!(self.inc_edges[key].value(), Some(arc.last_orig_edge));
        debug_assert_eq!(self.adj_nodes[key].value(), Some(arc.head));
        self.weights[key] = weight;
        self.edges[key] = InRangeOption::some(arc.edge);
        self.parents[key] = parent;
        match (self.is_potential_bridge_path[key], is_potential_bridge_path) {
            (false, true) => self.num_potential_bridge_paths += 1,
            (true, false) => self.num_potential_bridge_paths -= 1,
            _ => (),
        }
        self.is_potential_bridge_path[key] = is_potential_bridge_path;
    }

    /// Bookkeeping when `key` leaves the frontier. The flag of the entry stays.
    pub fn mark_settled(&mut self, key: EdgeKey) {
        if self.is_potential_bridge_path[key] {
            self.num_potential_bridge_paths -= 1;
        }
    }

    /// Make every key touched since the last reset undiscovered again.
    pub fn reset(&mut self) {
        for key in self.changed.drain(..) {
            self.weights[key] = INFINITY;
            self.edges[key] = InRangeOption::NONE;
            self.inc_edges[key] = InRangeOption::NONE;
            self.adj_nodes[key] = InRangeOption::NONE;
            self.parents[key] = Parent::Unset;
            self.is_potential_bridge_path[key] = false;
        }
        self.num_potential_bridge_paths = 0;
    }

    pub fn touched_keys(&self) -> &[EdgeKey] {
        &self.changed
    }

    pub fn num_potential_bridge_paths(&self) -> usize {
        self.num_potential_bridge_paths
    }

    pub fn weight(&self, key: EdgeKey) -> Weight {
        self.weights[key]
    }

    pub fn edge(&self, key: EdgeKey) -> Option<EdgeId> {
        self.edges[key].value()
    }

    pub fn inc_edge(&self, key: EdgeKey) -> Option<EdgeId> {
        self.inc_edges[key].value()
    }

    pub fn adj_node(&self, key: EdgeKey) -> Option<NodeId> {
        self.adj_nodes[key].value()
    }

    pub fn parent(&self, key: EdgeKey) -> Parent {
        self.parents[key]
    }

    pub fn is_potential_bridge_path(&self, key: EdgeKey) -> bool {
        self.is_potential_bridge_path[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(edge: EdgeId, head: NodeId) -> ChArc {
        ChArc {
            edge,
            head,
            first_orig_edge: edge,
            last_orig_edge: edge,
            weight: 1.0,
        }
    }

    #[test]
    fn counts_potential_bridge_paths() {
        let mut tree = ShortestPathTree::new(8);
        tree.insert(0, &arc(0, 1), 1.0, Parent::Root(0), true);
        tree.insert(2, &arc(1, 2), 4.0, Parent::Entry(0), true);
        assert_eq!(tree.num_potential_bridge_paths(), 2);

        tree.improve(2, &arc(1, 2), 3.0, Parent::Entry(0), false);
        assert_eq!(tree.num_potential_bridge_paths(), 1);
        assert_eq!(tree.weight(2), 3.0);

        tree.mark_settled(0);
        assert_eq!(tree.num_potential_bridge_paths(), 0);
        assert!(tree.is_potential_bridge_path(0));
        assert_eq!(tree.parent(2), Parent::Entry(0));
    }

    #[test]
    fn reset_restores_undiscovered_state() {
        let mut tree = ShortestPathTree::new(8);
        tree.insert(5, &arc(2, 3), 2.5, Parent::Root(0), true);
        tree.insert(1, &arc(0, 0), 7.0, Parent::Entry(5), false);
        assert_eq!(tree.touched_keys(), &[5, 1]);

        tree.reset();
        assert!(tree.touched_keys().is_empty());
        assert_eq!(tree.num_potential_bridge_paths(), 0);
        for key in 0..tree.num_keys() {
            assert!(!tree.is_discovered(key));
            assert_eq!(tree.weight(key), INFINITY);
            assert_eq!(tree.inc_edge(key), None);
            assert_eq!(tree.adj_node(key), None);
            assert_eq!(tree.parent(key), Parent::Unset);
            assert!(!tree.is_potential_bridge_path(key));
        }

        // a second reset has nothing left to do
        tree.reset();
        assert!(tree.touched_keys().is_empty());
    }

    #[test]
    #[should_panic]
    fn improving_requires_strictly_better_weight() {
        let mut tree = ShortestPathTree::new(2);
        tree.insert(0, &arc(0, 1), 1.0, Parent::Root(0), false);
        tree.improve(0, &arc(0, 1), 1.0, Parent::Root(1), false);
    }
}
