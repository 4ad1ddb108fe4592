#[allow(clippy::module_inception)]
pub mod as_graph;

pub use as_graph::{normalize_edge, ASBuilder, ASGraph, ASPair, AS, ASN};
