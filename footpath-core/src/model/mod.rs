//! Footpath network model
//!
//! Contains the durable graph built from path geometry and the per-query
//! working copy that snapping and patching mutate.

pub mod components;
pub mod graph;
pub mod query;
pub mod spatial;

pub use components::{Components, Edge, EdgeKind, Node, Segment};
pub use graph::FootpathGraph;
pub use query::QueryGraph;
pub use spatial::SpatialIndex;
