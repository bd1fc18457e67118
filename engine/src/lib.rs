//! Local witness path searches for the preparation of edge based contraction hierarchies.
//!
//! The interesting part lives in `algo::witness_search`.
//! Everything else is the infrastructure around it: graph collaborators with turn costs,
//! the priority queue, IO for graphs in the RoutingKit format and experiment reporting.

#[macro_use]
pub mod report;
pub mod algo;
pub mod cli;
pub mod datastr;
pub mod io;
pub mod util;

#[allow(dead_code)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
