//! Footpath graph components - nodes, edges, segments and connected components

use serde::Serialize;

use crate::{LatLng, Meters, NodeId};

/// Footpath graph node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Index of the node in the graph
    pub id: NodeId,
    /// Node coordinates
    pub position: LatLng,
    /// Set for query-scoped nodes spliced into a working copy
    pub is_virtual: bool,
}

/// Why an edge exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Consecutive vertices of a source polyline, or a piece of one
    Original,
    /// Endpoints joined by the tolerance pass
    ToleranceBridge,
    /// Nearest nodes of two components joined by the component pass
    ComponentBridge,
    /// Penalised hop added while answering a single query
    QueryHop,
}

/// Directed adjacency record. Every logical edge is stored once per endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    /// Routing cost in meters
    pub weight: Meters,
    pub kind: EdgeKind,
}

/// Physical line between two consecutive polyline vertices, kept for
/// projecting query points onto the middle of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: NodeId,
    pub b: NodeId,
    pub a_position: LatLng,
    pub b_position: LatLng,
    pub length: Meters,
    /// Index of the source feature
    pub feature: usize,
}

impl Segment {
    /// True if both segments join the same pair of nodes, in either direction
    pub fn same_nodes(&self, other: &Segment) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// Connected component labelling of a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    of_node: Vec<usize>,
    count: usize,
}

impl Components {
    pub(crate) fn new(of_node: Vec<usize>, count: usize) -> Self {
        Self { of_node, count }
    }

    pub fn of(&self, node: NodeId) -> Option<usize> {
        self.of_node.get(node).copied()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn same(&self, a: NodeId, b: NodeId) -> bool {
        matches!((self.of(a), self.of(b)), (Some(x), Some(y)) if x == y)
    }

    /// Node ids belonging to component `component`
    pub fn members(&self, component: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.of_node
            .iter()
            .enumerate()
            .filter(move |&(_, &c)| c == component)
            .map(|(node, _)| node)
    }
}
