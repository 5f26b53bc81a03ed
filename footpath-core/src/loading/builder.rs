use hashbrown::HashMap;
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

use super::repair::repair_connectivity;
use crate::model::{EdgeKind, FootpathGraph, Segment};
use crate::{LatLng, NodeId, RepairConfig, haversine_meters};

/// Coordinates closer than 1e-7 degrees (about 1 cm) share a node
const COORD_KEY_SCALE: f64 = 1e7;

/// One raw path polyline
#[derive(Debug, Clone, PartialEq)]
pub struct PathFeature {
    /// Human readable label used in diagnostics
    pub label: String,
    /// Vertices in `(lat, lng)` order
    pub coordinates: Vec<LatLng>,
}

impl PathFeature {
    pub fn new(label: impl Into<String>, coordinates: Vec<LatLng>) -> Self {
        Self {
            label: label.into(),
            coordinates,
        }
    }
}

/// Build-time diagnostics. Carries no behavioural contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildStats {
    pub features: usize,
    pub skipped_features: usize,
    pub nodes: usize,
    pub raw_edges: usize,
    pub segments: usize,
    pub components_before_repair: usize,
    pub endpoint_tolerance_m: f64,
    pub endpoint_bridges: usize,
    pub component_bridges: usize,
    pub components_after_repair: usize,
}

/// Incrementally turns polylines into graph topology
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: FootpathGraph,
    node_keys: HashMap<(i64, i64), NodeId>,
    features: usize,
    skipped: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one polyline. Returns false if it was skipped as malformed:
    /// fewer than two vertices or any non-finite coordinate.
    pub fn add_path(&mut self, coordinates: &[LatLng]) -> bool {
        let feature = self.features;
        self.features += 1;

        if coordinates.len() < 2 || coordinates.iter().any(|c| !c.is_finite()) {
            self.skipped += 1;
            return false;
        }

        let ids: Vec<NodeId> = coordinates.iter().map(|c| self.node_for(*c)).collect();

        for (&a, &b) in ids.iter().tuple_windows() {
            if a == b {
                continue;
            }
            let (Some(a_position), Some(b_position)) =
                (self.graph.position(a), self.graph.position(b))
            else {
                continue;
            };
            let length = haversine_meters(a_position, b_position);

            self.graph.add_edge(a, b, length, EdgeKind::Original);
            self.graph.push_segment(Segment {
                a,
                b,
                a_position,
                b_position,
                length,
                feature,
            });
        }
        true
    }

    fn node_for(&mut self, position: LatLng) -> NodeId {
        let key = coord_key(position);
        if let Some(&id) = self.node_keys.get(&key) {
            return id;
        }
        let id = self.graph.add_node(position);
        self.node_keys.insert(key, id);
        id
    }

    /// Statistics of the unrepaired graph built so far
    pub fn stats(&self) -> BuildStats {
        BuildStats {
            features: self.features,
            skipped_features: self.skipped,
            nodes: self.graph.node_count(),
            raw_edges: self.graph.edge_count(),
            segments: self.graph.segments().len(),
            components_before_repair: self.graph.component_count(),
            ..BuildStats::default()
        }
    }

    /// Finishes the build without connectivity repair
    pub fn finish(self) -> FootpathGraph {
        let graph = self.graph;
        graph.components();
        graph.spatial_index();
        graph
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coord_key(position: LatLng) -> (i64, i64) {
    (
        (position.lat * COORD_KEY_SCALE).round() as i64,
        (position.lng * COORD_KEY_SCALE).round() as i64,
    )
}

/// Builds the durable footpath graph from raw features and repairs its
/// connectivity.
///
/// Malformed features are skipped individually; an input without a single
/// usable feature produces an empty graph, which routing handles by falling
/// back to straight lines.
pub fn build_footpath_graph(
    features: &[PathFeature],
    config: &RepairConfig,
) -> (FootpathGraph, BuildStats) {
    let config = config.sanitized();
    let mut builder = GraphBuilder::new();

    for feature in features {
        if !builder.add_path(&feature.coordinates) {
            warn!(
                "Skipping path feature '{}' with {} vertices: fewer than two usable coordinates",
                feature.label,
                feature.coordinates.len()
            );
        }
    }

    let mut stats = builder.stats();
    let mut graph = builder.graph;

    let report = repair_connectivity(&mut graph, &config);
    stats.endpoint_tolerance_m = config.endpoint_tolerance_m;
    stats.endpoint_bridges = report.endpoint_bridges;
    stats.component_bridges = report.component_bridges;
    stats.components_after_repair = report.components_after;

    info!(
        "Footpath graph built: {} nodes, {} edges, {} segments from {} features ({} skipped)",
        graph.node_count(),
        stats.raw_edges,
        stats.segments,
        stats.features,
        stats.skipped_features
    );
    info!(
        "Connectivity repair: {} endpoint bridges (tolerance {} m), {} component bridges, {} -> {} components",
        stats.endpoint_bridges,
        stats.endpoint_tolerance_m,
        stats.component_bridges,
        stats.components_before_repair,
        stats.components_after_repair
    );

    graph.spatial_index();
    (graph, stats)
}
