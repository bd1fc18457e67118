//! Data structures used by algorithms.

pub mod graph;
pub mod index_heap;
