//! Core data types: references, vertices, and the decoded object graph.

pub mod graph;
pub mod vertex;

pub use graph::{Graph, Namespace, Reference};
pub use vertex::{Extensions, RegexOptions, Vertex};
