//! Durable footpath graph
//!
//! Nodes live in a dense vector (id = index) and every node owns one
//! adjacency list, possibly empty. Edges are stored symmetrically.

use std::sync::{Arc, OnceLock};

use fixedbitset::FixedBitSet;

use super::components::{Components, Edge, EdgeKind, Node, Segment};
use super::spatial::{SpatialIndex, within_radius};
use crate::{LatLng, Meters, NodeId, haversine_meters};

#[derive(Debug, Clone, Default)]
pub struct FootpathGraph {
    nodes: Vec<Node>,
    adjacency: Vec<Vec<Edge>>,
    segments: Arc<Vec<Segment>>,
    /// Invalidated by every edge insertion
    components: OnceLock<Components>,
    /// Covers the nodes that existed when it was first requested
    spatial: OnceLock<Arc<SpatialIndex>>,
}

impl FootpathGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn position(&self, id: NodeId) -> Option<LatLng> {
        self.nodes.get(id).map(|node| node.position)
    }

    /// Adjacency records of `id`; empty for unknown ids
    pub fn edges(&self, id: NodeId) -> &[Edge] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.edges(id).len()
    }

    /// Number of logical (undirected) edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Number of logical edges of the given kind
    pub fn edge_count_of(&self, kind: EdgeKind) -> usize {
        self.adjacency
            .iter()
            .flatten()
            .filter(|edge| edge.kind == kind)
            .count()
            / 2
    }

    /// Sum of logical edge weights
    pub fn total_edge_weight(&self) -> Meters {
        self.adjacency
            .iter()
            .flatten()
            .map(|edge| edge.weight)
            .sum::<f64>()
            / 2.0
    }

    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges(a).iter().find(|edge| edge.to == b)
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edge(a, b).is_some()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn add_node(&mut self, position: LatLng) -> NodeId {
        self.push_node(position, false)
    }

    pub(crate) fn add_virtual_node(&mut self, position: LatLng) -> NodeId {
        self.push_node(position, true)
    }

    fn push_node(&mut self, position: LatLng, is_virtual: bool) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            position,
            is_virtual,
        });
        self.adjacency.push(Vec::new());
        // A new node is its own component
        self.components = OnceLock::new();
        id
    }

    /// Adds the symmetric pair of adjacency records for `a - b`.
    ///
    /// Returns false without touching the graph for self edges, unknown
    /// nodes, negative or non-finite weights, and pairs that are already
    /// connected.
    pub(crate) fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: Meters,
        kind: EdgeKind,
    ) -> bool {
        if a == b || a >= self.nodes.len() || b >= self.nodes.len() {
            return false;
        }
        if !(weight.is_finite() && weight >= 0.0) || self.has_edge(a, b) {
            return false;
        }

        self.adjacency[a].push(Edge { to: b, weight, kind });
        self.adjacency[b].push(Edge { to: a, weight, kind });
        self.components = OnceLock::new();
        true
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) {
        Arc::make_mut(&mut self.segments).push(segment);
    }

    /// Inserts a virtual node at parameter `t` along `segment`, connected to
    /// both segment ends with weights `t * length` and `(1 - t) * length`.
    /// The segment's own edge is left in place.
    pub(crate) fn subdivide_segment(
        &mut self,
        segment: &Segment,
        position: LatLng,
        t: f64,
    ) -> NodeId {
        let t = t.clamp(0.0, 1.0);
        let id = self.add_virtual_node(position);
        self.add_edge(segment.a, id, t * segment.length, EdgeKind::Original);
        self.add_edge(id, segment.b, (1.0 - t) * segment.length, EdgeKind::Original);
        id
    }

    /// Connected components, computed by flood fill on first use
    pub fn components(&self) -> &Components {
        self.components.get_or_init(|| self.flood_fill())
    }

    pub fn component_of(&self, id: NodeId) -> Option<usize> {
        self.components().of(id)
    }

    pub fn component_count(&self) -> usize {
        self.components().count()
    }

    fn flood_fill(&self) -> Components {
        let n = self.nodes.len();
        let mut visited = FixedBitSet::with_capacity(n);
        let mut of_node = vec![usize::MAX; n];
        let mut count = 0;
        let mut stack = Vec::new();

        for start in 0..n {
            if visited.put(start) {
                continue;
            }
            of_node[start] = count;
            stack.push(start);

            while let Some(node) = stack.pop() {
                for edge in &self.adjacency[node] {
                    if !visited.put(edge.to) {
                        of_node[edge.to] = count;
                        stack.push(edge.to);
                    }
                }
            }
            count += 1;
        }

        Components::new(of_node, count)
    }

    /// Spatial index over the nodes present at first use
    pub fn spatial_index(&self) -> &SpatialIndex {
        self.spatial.get_or_init(|| {
            let positions: Vec<LatLng> = self.nodes.iter().map(|node| node.position).collect();
            Arc::new(SpatialIndex::new(&positions))
        })
    }

    /// Nodes within `radius` meters of `point`, with their distances
    pub fn nodes_within(&self, point: LatLng, radius: Meters) -> Vec<(NodeId, Meters)> {
        let index = self.spatial_index();
        let mut found: Vec<(NodeId, Meters)> = index
            .within(point, radius)
            .filter_map(|id| within_radius(point, self.nodes[id].position, radius).map(|d| (id, d)))
            .collect();

        // Nodes appended after the index was built
        found.extend(self.nodes[index.len()..].iter().filter_map(|node| {
            within_radius(point, node.position, radius).map(|d| (node.id, d))
        }));
        found
    }

    /// Nearest node to `point` and its distance
    pub fn nearest_node(&self, point: LatLng) -> Option<(NodeId, Meters)> {
        let index = self.spatial_index();
        let indexed = index
            .nearest(point)
            .map(|id| (id, haversine_meters(point, self.nodes[id].position)));

        self.nodes[index.len()..]
            .iter()
            .map(|node| (node.id, haversine_meters(point, node.position)))
            .chain(indexed)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }
}
