//! Per-query working copy of the footpath graph

use std::ops::Deref;

use super::components::EdgeKind;
use super::graph::FootpathGraph;
use crate::routing::SnapResult;
use crate::{Meters, NodeId};

/// Private clone of a [`FootpathGraph`] that a single query may mutate.
///
/// The only way to obtain one is to copy a durable graph, so splicing snap
/// nodes and adding heuristic hops can never reach the shared original.
#[derive(Debug, Clone)]
pub struct QueryGraph {
    graph: FootpathGraph,
}

impl QueryGraph {
    pub fn from_durable(graph: &FootpathGraph) -> Self {
        // Warm the shared caches so every clone reuses them
        graph.spatial_index();
        graph.components();
        Self {
            graph: graph.clone(),
        }
    }

    /// Turns a snap into a routable node: node snaps reuse the node,
    /// segment snaps splice a virtual node into the segment.
    pub fn attach(&mut self, snap: &SnapResult) -> NodeId {
        match snap {
            SnapResult::Node { node, .. } => *node,
            SnapResult::Segment {
                segment, point, t, ..
            } => self.graph.subdivide_segment(segment, *point, *t),
        }
    }

    /// Adds a penalised or direct query-scoped edge
    pub fn add_query_edge(&mut self, a: NodeId, b: NodeId, weight: Meters) -> bool {
        self.graph.add_edge(a, b, weight, EdgeKind::QueryHop)
    }

    /// Connects two nodes spliced into the same physical segment, which
    /// would otherwise only meet through the segment ends
    pub(crate) fn connect_along_segment(&mut self, a: NodeId, b: NodeId, weight: Meters) -> bool {
        self.graph.add_edge(a, b, weight, EdgeKind::Original)
    }
}

impl Deref for QueryGraph {
    type Target = FootpathGraph;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}
