pub mod as_graph;
pub mod as_graph_generators;

pub use as_graph::{ASBuilder, ASGraph, AS, ASN};
