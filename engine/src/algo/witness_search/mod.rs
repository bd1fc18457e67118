//! Local witness searches for the preparation of edge based contraction hierarchies.
//!
//! ```text
//! (source edge) -- s -- x -- t -- (target edge)
//! ```
//!
//! When contracting a node `x` (the center node), we have to decide for every pair of an original edge entering a
//! neighbor `s` of `x` and an original edge leaving a neighbor `t` of `x` whether the optimal path between them
//! (including the turn costs at `s` and `t`) has to go through `x`.
//! The optimal path is a *bridge path* if it has finite weight and consists of one arc from `s` to `x`, any number of loops at `x`
//! and one arc from `x` to `t`. Then a shortcut is needed.
//! Otherwise there is a *witness path* (or no path at all) and the shortcut can be omitted.
//!
//! The search is an edge based Dijkstra over the graph of uncontracted nodes, which tracks for every entry whether it
//! may still become a bridge path.
//! After `init_search` for a source edge, `run_search` can be called for many target edges. Each call continues to grow
//! the same shortest path tree, so later calls profit from the work of earlier ones.
//! To bound the effort, entries which can not lead to a bridge path are not expanded anymore once a limit of settled edges is exceeded.
//! The limit adapts itself to the number of edges settled in the previous searches.
//! Entries which can still become bridge paths are always expanded, so a bridge path is never missed.

use crate::datastr::{graph::*, index_heap::*};
use crate::util::NonNan;

pub mod shortest_path_tree;
pub mod stats;

use self::shortest_path_tree::{Parent, ShortestPathTree};
use self::stats::{OnFlyStatistics, Stats};
use std::cmp::max;

#[cfg(not(override_witness_sigma_factor))]
const SIGMA_FACTOR: f64 = 3.0;
#[cfg(override_witness_sigma_factor)]
const SIGMA_FACTOR: f64 = include!(concat!(env!("OUT_DIR"), "/WITNESS_SIGMA_FACTOR"));

#[cfg(not(override_witness_min_max_settled_edges))]
const MINIMUM_MAX_SETTLED_EDGES: usize = 100;
#[cfg(override_witness_min_max_settled_edges)]
const MINIMUM_MAX_SETTLED_EDGES: usize = include!(concat!(env!("OUT_DIR"), "/WITNESS_MIN_MAX_SETTLED_EDGES"));

#[cfg(not(override_witness_stats_reset_interval))]
const SETTLED_EDGE_STATS_RESET_INTERVAL: usize = 10_000;
#[cfg(override_witness_stats_reset_interval)]
const SETTLED_EDGE_STATS_RESET_INTERVAL: usize = include!(concat!(env!("OUT_DIR"), "/WITNESS_STATS_RESET_INTERVAL"));

/// Paths which are not bridge paths win ties within this tolerance.
const WITNESS_TOLERANCE: Weight = 1e-6;

/// Parameters for the settled edge limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WitnessSearchConfig {
    /// The limit for the next searches is `mean + sigma_factor * standard deviation` of the settled edges in the previous searches.
    /// Assuming a normal distribution, 3.0 means that about 99.7% of the searches stay within the limit.
    pub sigma_factor: f64,
    /// The limit never drops below this value.
    pub minimum_max_settled_edges: usize,
    /// Number of searches after which the limit gets recomputed.
    pub settled_edge_stats_reset_interval: usize,
}

impl Default for WitnessSearchConfig {
    fn default() -> Self {
        WitnessSearchConfig {
            sigma_factor: SIGMA_FACTOR,
            minimum_max_settled_edges: MINIMUM_MAX_SETTLED_EDGES,
            settled_edge_stats_reset_interval: SETTLED_EDGE_STATS_RESET_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct State {
    weight: NonNan,
    key: EdgeKey,
}

impl State {
    fn new(key: EdgeKey, weight: Weight) -> State {
        State {
            weight: NonNan::new(weight).expect("NaN weight in witness search"),
            key,
        }
    }
}

impl Indexing for State {
    #[inline]
    fn as_index(&self) -> usize {
        self.key
    }
}

/// The turn from the source edge onto the first arc of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootEntry {
    pub source_node: NodeId,
    pub source_edge: EdgeId,
    /// First original edge of the arc taken at the source node
    pub first_orig_edge: EdgeId,
    pub turn_weight: Weight,
}

/// A shortest path tree entry: arriving at `adj_node` through arc `edge` whose last original edge is `inc_edge`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEntry {
    pub edge: EdgeId,
    pub inc_edge: EdgeId,
    pub adj_node: NodeId,
    /// Weight from the source edge up to and including this arc
    pub weight: Weight,
}

/// The optimal path from the source edge to the target edge if it is a bridge path.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgePath {
    root: RootEntry,
    entries: Vec<PathEntry>,
    weight: Weight,
}

impl BridgePath {
    pub fn root(&self) -> &RootEntry {
        &self.root
    }

    /// Entries of the path starting at the source node, the last one arrives at the target node.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// The entry arriving at the target node
    pub fn last(&self) -> &PathEntry {
        // paths always contain at least the entry leaving the source node
        &self.entries[self.entries.len() - 1]
    }

    /// Weight including the turn onto the target edge.
    pub fn weight(&self) -> Weight {
        self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Session {
    Idle,
    Armed { center: NodeId, source: NodeId, source_edge: EdgeId },
}

#[derive(Debug, Clone, Copy)]
struct BestPath {
    weight: Weight,
    key: Option<EdgeKey>,
    is_bridge_path: bool,
}

/// The owned data of a `WitnessPathSearcher` without the graph borrow.
#[derive(Debug)]
pub struct WitnessSearchData {
    config: WitnessSearchConfig,
    tree: ShortestPathTree,
    heap: IndexdMinHeap<State>,
    roots: Vec<RootEntry>,
    max_settled_edges: usize,
    settled_edges_stats: OnFlyStatistics,
    batch_stats: Stats,
    total_stats: Stats,
}

#[derive(Debug)]
pub struct WitnessPathSearcher<'a, G> {
    graph: &'a G,
    config: WitnessSearchConfig,

    tree: ShortestPathTree,
    heap: IndexdMinHeap<State>,
    roots: Vec<RootEntry>,
    session: Session,

    num_settled_edges: usize,
    num_polled_edges: usize,
    // weight of the entry polled last in this session, polled weights never decrease
    last_polled_weight: Weight,
    max_settled_edges: usize,
    settled_edges_stats: OnFlyStatistics,

    batch_stats: Stats,
    total_stats: Stats,
}

impl<'a, G: EdgeBasedChGraph> WitnessPathSearcher<'a, G> {
    pub fn new(graph: &'a G, config: WitnessSearchConfig) -> WitnessPathSearcher<'a, G> {
        let num_keys = 2 * graph.num_original_edges();

        WitnessPathSearcher {
            graph,
            config,
            tree: ShortestPathTree::new(num_keys),
            heap: IndexdMinHeap::new(num_keys),
            roots: Vec::new(),
            session: Session::Idle,
            num_settled_edges: 0,
            num_polled_edges: 0,
            last_polled_weight: -INFINITY,
            max_settled_edges: config.minimum_max_settled_edges,
            settled_edges_stats: OnFlyStatistics::default(),
            batch_stats: Stats::default(),
            total_stats: Stats::default(),
        }
    }

    /// Create a searcher on a new graph borrow from recycled data.
    /// The counterpart is the `recycle` method.
    pub fn from_recycled(graph: &'a G, recycled: WitnessSearchData) -> WitnessPathSearcher<'a, G> {
        assert!(recycled.tree.num_keys() >= 2 * graph.num_original_edges());
        debug_assert!(recycled.tree.touched_keys().is_empty());

        WitnessPathSearcher {
            graph,
            config: recycled.config,
            tree: recycled.tree,
            heap: recycled.heap,
            roots: recycled.roots,
            session: Session::Idle,
            num_settled_edges: 0,
            num_polled_edges: 0,
            last_polled_weight: -INFINITY,
            max_settled_edges: recycled.max_settled_edges,
            settled_edges_stats: recycled.settled_edges_stats,
            batch_stats: recycled.batch_stats,
            total_stats: recycled.total_stats,
        }
    }

    /// Finish the current search and release the graph borrow.
    /// Keeps the allocations, the settled edge limit and the statistics.
    pub fn recycle(mut self) -> WitnessSearchData {
        self.finish_session();

        WitnessSearchData {
            config: self.config,
            tree: self.tree,
            heap: self.heap,
            roots: self.roots,
            max_settled_edges: self.max_settled_edges,
            settled_edges_stats: self.settled_edges_stats,
            batch_stats: self.batch_stats,
            total_stats: self.total_stats,
        }
    }

    /// Throw away the previous shortest path tree and start a new search from `source_edge` entering `source_node`.
    /// Returns the number of initial entries.
    /// This is always 0 if `center_node` can not be reached directly from the source edge,
    /// in which case no bridge path can exist and there is no need to call `run_search`.
    pub fn init_search(&mut self, center_node: NodeId, source_node: NodeId, source_edge: EdgeId) -> usize {
        self.finish_session();
        let graph = self.graph;

        for arc in graph.out_arcs(source_node) {
            if graph.is_contracted(arc.head) {
                continue;
            }
            let turn_weight = self.calc_turn_weight(source_edge, source_node, arc.first_orig_edge);
            if turn_weight.is_infinite() {
                continue;
            }
            let weight = turn_weight + graph.arc_weight(source_node, &arc, None);
            let is_potential_bridge_path = arc.head == center_node;
            let key = graph.edge_key(arc.last_orig_edge, arc.head);

            // several arcs may arrive on the same key, only the best one is needed
            if !self.tree.is_discovered(key) || weight < self.tree.weight(key) {
                self.roots.push(RootEntry {
                    source_node,
                    source_edge,
                    first_orig_edge: arc.first_orig_edge,
                    turn_weight,
                });
                let root = Parent::Root(self.roots.len() - 1);
                if self.tree.is_discovered(key) {
                    self.tree.improve(key, &arc, weight, root, is_potential_bridge_path);
                } else {
                    self.tree.insert(key, &arc, weight, root, is_potential_bridge_path);
                }
            }
        }

        if self.tree.num_potential_bridge_paths() == 0 {
            self.clear_tree();
            return 0;
        }

        for &key in self.tree.touched_keys() {
            self.heap.push(State::new(key, self.tree.weight(key)));
        }
        self.session = Session::Armed {
            center: center_node,
            source: source_node,
            source_edge,
        };

        self.batch_stats.num_searches += 1;
        // the limit may be unbounded
        let max_settled_edges = self.max_settled_edges as u64;
        self.batch_stats.max_num_settled_edges = self.batch_stats.max_num_settled_edges.saturating_add(max_settled_edges);
        self.total_stats.num_searches += 1;
        self.total_stats.max_num_settled_edges = self.total_stats.max_num_settled_edges.saturating_add(max_settled_edges);

        self.heap.len()
    }

    /// Determine the optimal path from the source edge to `target_edge` leaving `target_node`.
    /// Returns it if it is a bridge path and `None` if it is a witness path or if there is no path at all.
    /// Panics if no search was initialized.
    pub fn run_search(&mut self, target_node: NodeId, target_edge: EdgeId) -> Option<BridgePath> {
        let (center_node, source_node, source_edge) = match self.session {
            Session::Armed { center, source, source_edge } => (center, source, source_edge),
            Session::Idle => panic!("run_search called without an initialized search"),
        };
        let graph = self.graph;

        // with source and target being equal, a single turn is already a candidate
        let mut best = BestPath {
            weight: if source_node == target_node {
                self.calc_turn_weight(source_edge, source_node, target_edge)
            } else {
                INFINITY
            },
            key: None,
            is_bridge_path: false,
        };

        // the tree of previous calls may already reach the target
        for inc_edge in graph.original_in_edges(target_node) {
            let key = graph.edge_key(inc_edge, target_node);
            if self.tree.is_discovered(key) {
                self.update_best_path(&mut best, target_node, target_edge, key);
            }
        }

        while let Some(&State { key: curr, .. }) = self.heap.peek() {
            if self.tree.num_potential_bridge_paths() == 0 && (!best.is_bridge_path || best.weight.is_infinite()) {
                break;
            }
            let curr_weight = self.tree.weight(curr);
            if curr_weight > best.weight {
                // only peeked, the entry stays in the queue for the next target
                break;
            }

            debug_assert!(curr_weight >= self.last_polled_weight, "polled weights decreased");
            self.last_polled_weight = curr_weight;
            self.heap.pop();
            self.num_polled_edges += 1;
            self.batch_stats.num_polled_edges += 1;
            self.total_stats.num_polled_edges += 1;

            self.tree.mark_settled(curr);
            let curr_is_potential_bridge_path = self.tree.is_potential_bridge_path(curr);
            if self.num_settled_edges > self.max_settled_edges && !curr_is_potential_bridge_path {
                continue;
            }

            let adj_node = self.tree.adj_node(curr).expect("queued edge key without tree entry");
            let inc_edge = self.tree.inc_edge(curr).expect("queued edge key without tree entry");

            for arc in graph.out_arcs(adj_node) {
                if graph.is_contracted(arc.head) {
                    continue;
                }
                // no u-turns
                if arc.first_orig_edge == inc_edge {
                    continue;
                }
                let weight = curr_weight + graph.arc_weight(adj_node, &arc, Some(inc_edge));
                if weight.is_infinite() {
                    continue;
                }
                let is_potential_bridge_path = curr_is_potential_bridge_path && arc.head == center_node;
                let key = graph.edge_key(arc.last_orig_edge, arc.head);

                if !self.tree.is_discovered(key) {
                    self.tree.insert(key, &arc, weight, Parent::Entry(curr), is_potential_bridge_path);
                    self.heap.push(State::new(key, weight));
                    self.update_best_path(&mut best, target_node, target_edge, key);
                } else if weight < self.tree.weight(key) {
                    // polled entries have their final weight
                    assert!(self.heap.contains_index(key), "improved edge key {} which was already polled", key);
                    self.tree.improve(key, &arc, weight, Parent::Entry(curr), is_potential_bridge_path);
                    self.heap.decrease_key(State::new(key, weight));
                    self.update_best_path(&mut best, target_node, target_edge, key);
                }
            }

            self.num_settled_edges += 1;
            self.batch_stats.num_settled_edges += 1;
            self.total_stats.num_settled_edges += 1;
        }

        match best {
            BestPath {
                is_bridge_path: true,
                key: Some(key),
                weight,
            } => Some(self.reconstruct_path(key, weight)),
            _ => None,
        }
    }

    pub fn statistics_string(&self) -> String {
        format!("last batch: {}, total: {}", self.batch_stats, self.total_stats)
    }

    /// Reset the counters of the current batch. The totals are kept.
    pub fn reset_stats(&mut self) {
        self.batch_stats.reset();
    }

    pub fn batch_stats(&self) -> &Stats {
        &self.batch_stats
    }

    pub fn total_stats(&self) -> &Stats {
        &self.total_stats
    }

    /// Edges polled since the last `init_search`
    pub fn num_polled_edges(&self) -> usize {
        self.num_polled_edges
    }

    pub fn total_num_searches(&self) -> u64 {
        self.total_stats.num_searches
    }

    /// The settled edge limit for the current search
    pub fn current_max_settled_edges(&self) -> usize {
        self.max_settled_edges
    }

    fn finish_session(&mut self) {
        if let Session::Armed { .. } = self.session {
            self.update_max_settled_edges();
        }
        self.session = Session::Idle;
        self.num_settled_edges = 0;
        self.num_polled_edges = 0;
        self.last_polled_weight = -INFINITY;
        self.clear_tree();
    }

    fn clear_tree(&mut self) {
        self.tree.reset();
        self.roots.clear();
        self.heap.clear();
    }

    fn update_max_settled_edges(&mut self) {
        self.settled_edges_stats.add_observation(self.num_settled_edges as f64);
        if self.settled_edges_stats.count() >= self.config.settled_edge_stats_reset_interval as u64 {
            let estimate = self.settled_edges_stats.mean() + self.config.sigma_factor * self.settled_edges_stats.variance().sqrt();
            self.max_settled_edges = max(self.config.minimum_max_settled_edges, estimate as usize);
            self.settled_edges_stats.reset();
        }
    }

    fn update_best_path(&self, best: &mut BestPath, target_node: NodeId, target_edge: EdgeId, key: EdgeKey) {
        if self.tree.adj_node(key) != Some(target_node) {
            return;
        }
        let inc_edge = self.tree.inc_edge(key).expect("discovered edge key without incoming edge");
        let weight = self.tree.weight(key) + self.calc_turn_weight(inc_edge, target_node, target_edge);
        // paths starting at a root did not pass the center node
        let is_bridge_path = match self.tree.parent(key) {
            Parent::Entry(parent) => self.tree.is_potential_bridge_path(parent),
            Parent::Root(_) | Parent::Unset => false,
        };
        let tolerance = if is_bridge_path { 0.0 } else { WITNESS_TOLERANCE };
        if weight - tolerance < best.weight {
            *best = BestPath {
                weight,
                key: Some(key),
                is_bridge_path,
            };
        }
    }

    fn reconstruct_path(&self, mut key: EdgeKey, weight: Weight) -> BridgePath {
        let mut entries = Vec::new();
        loop {
            assert!(entries.len() < self.tree.touched_keys().len(), "parent chain does not terminate");
            entries.push(PathEntry {
                edge: self.tree.edge(key).expect("path entry without arc"),
                inc_edge: self.tree.inc_edge(key).expect("path entry without incoming edge"),
                adj_node: self.tree.adj_node(key).expect("path entry without node"),
                weight: self.tree.weight(key),
            });
            match self.tree.parent(key) {
                Parent::Entry(parent) => key = parent,
                Parent::Root(root) => {
                    entries.reverse();
                    return BridgePath {
                        root: self.roots[root],
                        entries,
                        weight,
                    };
                }
                Parent::Unset => panic!("tree entry {} without parent", key),
            }
        }
    }

    fn calc_turn_weight(&self, in_edge: EdgeId, via: NodeId, out_edge: EdgeId) -> Weight {
        if in_edge == out_edge {
            return INFINITY;
        }
        self.graph.turn_weight(in_edge, via, out_edge)
    }
}
