//! Something with graphs 🤷‍♂️
//!
//! Types and traits for graphs as seen by edge based contraction hierarchy preparation.
//! Edge based contraction keeps track of original edges rather than nodes, so arcs (original edges or shortcuts)
//! carry the ids of the first and last original edge they consist of. Turn costs are looked up between those.

pub mod preparation_graph;
pub mod road_graph;

pub use self::preparation_graph::PreparationGraph;
pub use self::road_graph::{RoadGraph, Segment, Turn};

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Edge ids are 32bit unsigned ints.
/// Original edges and shortcuts share one id space, shortcuts come after the original edges.
pub type EdgeId = u32;
/// Dense index of an original edge together with the node it was traversed to.
pub type EdgeKey = usize;
/// Weights are floats so that shortcut weights stay exact sums and turn restrictions can be infinite.
pub type Weight = f64;
/// Weight of forbidden turns and inaccessible directions.
pub const INFINITY: Weight = f64::INFINITY;

/// Edge key of the original edge `edge` when traversed along its stored direction (arriving at its adjacent node)
/// or against it (arriving at its base node).
/// Keys of all original edges lie in `[0, 2 * num_original_edges)`.
#[inline(always)]
pub fn edge_key(edge: EdgeId, forward: bool) -> EdgeKey {
    2 * edge as usize + if forward { 0 } else { 1 }
}

/// An arc leaving a node in the graph of not yet contracted nodes.
/// Either an original edge traversed in one of its directions or a shortcut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChArc {
    /// Id of the original edge or shortcut
    pub edge: EdgeId,
    /// The node this arc leads to
    pub head: NodeId,
    /// The original edge on which this arc leaves its tail
    pub first_orig_edge: EdgeId,
    /// The original edge on which this arc arrives at its head
    pub last_orig_edge: EdgeId,
    pub weight: Weight,
}

/// Everything the witness search needs to know about the graph during preparation.
/// All methods are read only, so a single graph can be shared between several searchers on different threads.
pub trait EdgeBasedChGraph {
    type OutArcs<'a>: Iterator<Item = ChArc> + 'a
    where
        Self: 'a;
    type OrigInEdges<'a>: Iterator<Item = EdgeId> + 'a
    where
        Self: 'a;

    fn num_nodes(&self) -> usize;
    /// Number of original edges, which determines the range of edge keys.
    fn num_original_edges(&self) -> usize;

    /// All arcs leaving `node`, including arcs to already contracted nodes.
    fn out_arcs(&self, node: NodeId) -> Self::OutArcs<'_>;
    /// All original edges through which `node` can be entered.
    fn original_in_edges(&self, node: NodeId) -> Self::OrigInEdges<'_>;

    /// Has `node` already been assigned its final level?
    fn is_contracted(&self, node: NodeId) -> bool;

    /// Costs of turning from original edge `in_edge` onto original edge `out_edge` at node `via`.
    /// `INFINITY` for forbidden turns.
    fn turn_weight(&self, in_edge: EdgeId, via: NodeId, out_edge: EdgeId) -> Weight;

    /// Edge key of original edge `edge` when arriving at `adj_node` through it.
    fn edge_key(&self, edge: EdgeId, adj_node: NodeId) -> EdgeKey;

    /// Weight of `arc` leaving `tail`, including the turn from `preceding_orig_edge` onto the arc if there is one.
    #[inline]
    fn arc_weight(&self, tail: NodeId, arc: &ChArc, preceding_orig_edge: Option<EdgeId>) -> Weight {
        match preceding_orig_edge {
            Some(preceding) => self.turn_weight(preceding, tail, arc.first_orig_edge) + arc.weight,
            None => arc.weight,
        }
    }
}

/// Build a `first_out` array from an iterator of degrees by doing a prefix sum.
pub fn degrees_to_first_out<I: Iterator<Item = EdgeId>>(degrees: I) -> impl Iterator<Item = EdgeId> {
    std::iter::once(0).chain(degrees.scan(0, |state, degree| {
        *state += degree;
        Some(*state)
    }))
}
