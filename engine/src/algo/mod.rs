//! Building blocks for the preparation of contraction hierarchies.

pub mod witness_search;
