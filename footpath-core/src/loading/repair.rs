//! Build-time connectivity repair.
//!
//! Surveyed paths rarely meet exactly. Pass 1 joins dangling endpoints that
//! sit within a small tolerance of each other; pass 2 greedily joins whole
//! components through their globally nearest node pair while that pair is
//! within a larger threshold. Both passes are bounded and best-effort: the
//! graph may stay partitioned, and query-time patching covers the rest.

use hashbrown::HashMap;
use log::{debug, trace};
use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::model::{EdgeKind, FootpathGraph};
use crate::{LatLng, Meters, NodeId, RepairConfig, haversine_meters};

/// Meters per degree of latitude at the equator, the shortest it gets.
/// Grid cells sized with it are never narrower than the tolerance.
const MIN_METERS_PER_DEGREE_LAT: f64 = 110_574.0;

/// Extra cell size margin on top of the tolerance
const CELL_MARGIN: f64 = 1.2;

/// Outcome of both repair passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub endpoint_bridges: usize,
    pub component_bridges: usize,
    pub components_before: usize,
    pub components_after: usize,
}

/// Runs tolerance bridging followed by component bridging
pub fn repair_connectivity(graph: &mut FootpathGraph, config: &RepairConfig) -> RepairReport {
    let components_before = graph.component_count();
    let endpoint_bridges = bridge_endpoints(graph, config.endpoint_tolerance_m);
    let component_bridges = bridge_components(
        graph,
        config.component_bridge_max_m,
        config.component_bridge_max_iterations,
    );

    RepairReport {
        endpoint_bridges,
        component_bridges,
        components_before,
        components_after: graph.component_count(),
    }
}

/// Pass 1: bridges every pair of endpoints (degree <= 1) closer than
/// `tolerance` meters. Returns the number of edges added.
///
/// Endpoints are bucketed into a lat/lng grid whose cells are at least
/// `tolerance` wide, so each endpoint is only compared with the 3x3 block
/// of cells around it.
pub fn bridge_endpoints(graph: &mut FootpathGraph, tolerance: Meters) -> usize {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return 0;
    }

    let endpoints: Vec<NodeId> = graph
        .nodes()
        .iter()
        .filter(|node| graph.degree(node.id) <= 1)
        .map(|node| node.id)
        .collect();
    if endpoints.len() < 2 {
        return 0;
    }

    let grid = EndpointGrid::new(graph, &endpoints, tolerance);
    let mut candidates = Vec::new();

    for &n in &endpoints {
        let Some(position) = graph.position(n) else {
            continue;
        };
        for m in grid.neighbours(position) {
            if m <= n {
                continue;
            }
            if let Some(other) = graph.position(m) {
                let d = haversine_meters(position, other);
                if d <= tolerance {
                    candidates.push((n, m, d));
                }
            }
        }
    }

    let mut added = 0;
    for (a, b, d) in candidates {
        if graph.add_edge(a, b, d, EdgeKind::ToleranceBridge) {
            trace!("Tolerance bridge {a} <-> {b} ({d:.2} m)");
            added += 1;
        }
    }

    debug!(
        "Endpoint pass: {} endpoints, {added} bridges within {tolerance} m",
        endpoints.len()
    );
    added
}

struct EndpointGrid {
    cell_lat: f64,
    cell_lng: f64,
    buckets: HashMap<(i64, i64), Vec<NodeId>>,
}

impl EndpointGrid {
    fn new(graph: &FootpathGraph, endpoints: &[NodeId], tolerance: Meters) -> Self {
        let max_abs_lat = endpoints
            .iter()
            .filter_map(|&id| graph.position(id))
            .map(|p| p.lat.abs())
            .fold(0.0_f64, f64::max)
            .min(89.0);

        let cell_lat = tolerance * CELL_MARGIN / MIN_METERS_PER_DEGREE_LAT;
        // Longitude degrees shrink with latitude; size for the worst case
        let cell_lng = cell_lat / max_abs_lat.to_radians().cos();

        let mut grid = Self {
            cell_lat,
            cell_lng,
            buckets: HashMap::new(),
        };
        for &id in endpoints {
            if let Some(position) = graph.position(id) {
                let key = grid.cell(position.lat, position.lng);
                grid.buckets.entry(key).or_default().push(id);
            }
        }
        grid
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, lat: f64, lng: f64) -> (i64, i64) {
        (
            (lat / self.cell_lat).floor() as i64,
            (lng / self.cell_lng).floor() as i64,
        )
    }

    fn neighbours(&self, position: LatLng) -> impl Iterator<Item = NodeId> + '_ {
        let (row, col) = self.cell(position.lat, position.lng);
        (-1..=1)
            .flat_map(move |dr| (-1..=1).map(move |dc| (row + dr, col + dc)))
            .filter_map(|key| self.buckets.get(&key))
            .flatten()
            .copied()
    }
}

/// Pass 2: repeatedly bridges the globally nearest pair of nodes lying in
/// different components, as long as that pair is within `max_gap` meters,
/// for at most `max_iterations` bridges. Returns the number of edges added.
///
/// Equivalent to a bounded Kruskal run over all cross-component pairs within
/// `max_gap`, sorted by distance.
pub fn bridge_components(
    graph: &mut FootpathGraph,
    max_gap: Meters,
    max_iterations: usize,
) -> usize {
    let components = graph.components().clone();
    if components.count() < 2 || max_iterations == 0 || !(max_gap.is_finite() && max_gap >= 0.0) {
        return 0;
    }

    let mut candidates: Vec<(Meters, NodeId, NodeId)> = Vec::new();
    for node in graph.nodes() {
        let own = components.of(node.id);
        for (other, d) in graph.nodes_within(node.position, max_gap) {
            if other > node.id && components.of(other) != own {
                candidates.push((d, node.id, other));
            }
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

    let mut merged = UnionFind::<usize>::new(components.count());
    let mut remaining = components.count();
    let mut added = 0;

    for (d, a, b) in candidates {
        if added >= max_iterations || remaining <= 1 {
            break;
        }
        let (Some(ca), Some(cb)) = (components.of(a), components.of(b)) else {
            continue;
        };
        if merged.union(ca, cb) && graph.add_edge(a, b, d, EdgeKind::ComponentBridge) {
            trace!("Component bridge {a} <-> {b} ({d:.2} m)");
            remaining -= 1;
            added += 1;
        }
    }

    debug!(
        "Component pass: {} components, {added} bridges within {max_gap} m, {remaining} left",
        components.count()
    );
    added
}
