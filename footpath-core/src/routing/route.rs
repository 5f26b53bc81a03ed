//! Point-to-point walking routes

use geo::LineString;
use geojson::{Feature, Geometry};
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use super::dijkstra::shortest_path;
use super::patch::connect_heuristically;
use super::snap::{SnapResult, snap_point};
use crate::model::{FootpathGraph, QueryGraph};
use crate::{
    Error, FootpathConfig, LatLng, Meters, RouteConfig, bearing_degrees, haversine_meters,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Node,
    Segment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapSummary {
    pub kind: SnapKind,
    pub distance_m: Meters,
}

impl From<&SnapResult> for SnapSummary {
    fn from(snap: &SnapResult) -> Self {
        let kind = match snap {
            SnapResult::Node { .. } => SnapKind::Node,
            SnapResult::Segment { .. } => SnapKind::Segment,
        };
        Self {
            kind,
            distance_m: snap.distance_m(),
        }
    }
}

/// Why a straight line was returned instead of a network path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyGraph,
    SnapFailed,
    /// Patching ran for `attempts` iterations without joining both ends
    NoPathAfterPatching { attempts: usize },
}

/// Per-query diagnostics. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryStats {
    pub origin_snap: Option<SnapSummary>,
    pub destination_snap: Option<SnapSummary>,
    pub heuristic_hops: usize,
    pub patch_iterations: usize,
    pub fallback: Option<FallbackReason>,
}

/// Walking route between two points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Starts at the origin and ends at the destination
    pub points: Vec<LatLng>,
    pub distance_m: Meters,
    pub duration_s: f64,
    /// Set when no network path was found and `points` is a straight line
    pub degraded: bool,
    pub stats: QueryStats,
}

impl Route {
    /// Builds a route from already assembled points, collapsing consecutive
    /// near-duplicates and measuring the result
    pub(crate) fn from_points(
        points: impl IntoIterator<Item = LatLng>,
        degraded: bool,
        stats: QueryStats,
        config: &RouteConfig,
    ) -> Self {
        let points = dedup_points(points, config.dedup_epsilon_deg);
        let distance_m = polyline_length(&points);
        Self {
            points,
            distance_m,
            duration_s: distance_m / config.walking_speed_mps,
            degraded,
            stats,
        }
    }

    fn straight_line(
        origin: LatLng,
        destination: LatLng,
        reason: FallbackReason,
        mut stats: QueryStats,
        config: &RouteConfig,
    ) -> Self {
        stats.fallback = Some(reason);
        info!(
            "Falling back to a straight line ({reason:?}) from ({:.6}, {:.6}) to ({:.6}, {:.6})",
            origin.lat, origin.lng, destination.lat, destination.lng
        );
        Self::from_points([origin, destination], true, stats, config)
    }

    /// Heading of the first leg, `None` for single-point routes
    pub fn initial_bearing(&self) -> Option<f64> {
        let (first, second) = self.points.iter().tuple_windows().next()?;
        Some(bearing_degrees(*first, *second))
    }

    /// Converts the route to a `GeoJSON` `LineString` feature
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeoJsonError`] if the feature cannot be assembled.
    pub fn to_geojson(&self) -> Result<Feature, Error> {
        let line: LineString<f64> = self.points.iter().map(|p| geo::Coord::from(*p)).collect();

        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new((&line).into()),
            "properties": {
                "distance_m": self.distance_m,
                "duration_s": self.duration_s,
                "degraded": self.degraded,
            }
        });

        Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`Error::GeoJsonError`] if serialization fails.
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

/// Finds a walking route from `origin` to `destination`.
///
/// Both ends are snapped onto a private copy of `graph`, the copy is patched
/// with penalised hops if the ends sit in different components, and the
/// shortest path between the snaps is assembled into a polyline from
/// `origin` to `destination`. When no network path can be produced the
/// result is a straight line with `degraded` set.
///
/// # Errors
///
/// Returns [`Error::InvalidCoordinate`] for non-finite coordinates and
/// [`Error::InvalidConfig`] for an unusable configuration. Problems with
/// the graph itself never fail the query.
pub fn find_route(
    graph: &FootpathGraph,
    origin: LatLng,
    destination: LatLng,
    config: &FootpathConfig,
) -> Result<Route, Error> {
    for point in [origin, destination] {
        if !point.is_finite() {
            return Err(Error::InvalidCoordinate {
                lat: point.lat,
                lng: point.lng,
            });
        }
    }
    let config = config.validated()?;
    let mut stats = QueryStats::default();

    if graph.is_empty() {
        return Ok(Route::straight_line(
            origin,
            destination,
            FallbackReason::EmptyGraph,
            stats,
            &config.route,
        ));
    }

    let (Some(origin_snap), Some(destination_snap)) =
        (snap_point(graph, origin), snap_point(graph, destination))
    else {
        return Ok(Route::straight_line(
            origin,
            destination,
            FallbackReason::SnapFailed,
            stats,
            &config.route,
        ));
    };
    stats.origin_snap = Some(SnapSummary::from(&origin_snap));
    stats.destination_snap = Some(SnapSummary::from(&destination_snap));

    let mut working = QueryGraph::from_durable(graph);
    let source = working.attach(&origin_snap);
    let target = working.attach(&destination_snap);
    if let Some(weight) = origin_snap.offset_along_shared_segment(&destination_snap) {
        working.connect_along_segment(source, target, weight);
    }

    if !working.components().same(source, target) {
        let outcome = connect_heuristically(&mut working, source, target, &config.patch);
        stats.heuristic_hops = outcome.hops.len();
        stats.patch_iterations = outcome.iterations;
    }

    let Some(path) = shortest_path(&working, source, target) else {
        let attempts = stats.patch_iterations;
        return Ok(Route::straight_line(
            origin,
            destination,
            FallbackReason::NoPathAfterPatching { attempts },
            stats,
            &config.route,
        ));
    };
    debug!(
        "Shortest path over {} nodes, cost {:.1} m, {} heuristic hops",
        path.nodes.len(),
        path.cost,
        stats.heuristic_hops
    );

    // Snapped endpoints are replaced by their exact projections
    let interior = path
        .nodes
        .get(1..path.nodes.len().saturating_sub(1))
        .unwrap_or_default()
        .iter()
        .filter_map(|&id| working.position(id));

    let stub = |snap: &SnapResult| {
        if snap.distance_m() > config.route.stub_threshold_m {
            snap.point(&working)
        } else {
            None
        }
    };

    let points = std::iter::once(origin)
        .chain(stub(&origin_snap))
        .chain(interior)
        .chain(stub(&destination_snap))
        .chain(std::iter::once(destination));

    Ok(Route::from_points(points, false, stats, &config.route))
}

pub(crate) fn dedup_points(points: impl IntoIterator<Item = LatLng>, epsilon: f64) -> Vec<LatLng> {
    points
        .into_iter()
        .dedup_by(|a, b| a.approx_eq(b, epsilon))
        .collect()
}

pub(crate) fn polyline_length(points: &[LatLng]) -> Meters {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| haversine_meters(*a, *b))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::GraphBuilder;
    use crate::EARTH_RADIUS_M;

    fn offset(origin: LatLng, north_m: f64, east_m: f64) -> LatLng {
        let d_lat = (north_m / EARTH_RADIUS_M).to_degrees();
        let d_lng = (east_m / (EARTH_RADIUS_M * origin.lat.to_radians().cos())).to_degrees();
        LatLng::new(origin.lat + d_lat, origin.lng + d_lng)
    }

    /// A 100 m straight path running east
    fn straight_path() -> (FootpathGraph, LatLng) {
        let start = LatLng::new(52.73, -1.73);
        let mut builder = GraphBuilder::new();
        builder.add_path(&[start, offset(start, 0.0, 50.0), offset(start, 0.0, 100.0)]);
        (builder.finish(), start)
    }

    #[test]
    fn route_along_path_includes_projections() {
        let (graph, start) = straight_path();
        let origin = offset(start, 10.0, 20.0);
        let destination = offset(start, -5.0, 80.0);

        let route = find_route(&graph, origin, destination, &FootpathConfig::default()).unwrap();

        assert!(!route.degraded);
        assert_eq!(route.points.first(), Some(&origin));
        assert_eq!(route.points.last(), Some(&destination));
        // origin, projection, middle vertex, projection, destination
        assert_eq!(route.points.len(), 5);
        assert!((route.distance_m - 75.0).abs() < 0.5, "{}", route.distance_m);
        assert!((route.duration_s - route.distance_m / 1.4).abs() < 1e-9);

        let stats = &route.stats;
        assert_eq!(stats.origin_snap.map(|s| s.kind), Some(SnapKind::Segment));
        assert_eq!(stats.heuristic_hops, 0);
        assert!(stats.fallback.is_none());
    }

    #[test]
    fn points_on_path_skip_stubs() {
        let (graph, start) = straight_path();
        let origin = offset(start, 0.0, 20.0);
        let destination = offset(start, 0.0, 80.0);

        let route = find_route(&graph, origin, destination, &FootpathConfig::default()).unwrap();

        assert!(!route.degraded);
        assert_eq!(route.points.len(), 3);
        assert!((route.distance_m - 60.0).abs() < 0.1);
    }

    #[test]
    fn empty_graph_falls_back_to_straight_line() {
        let origin = LatLng::new(52.73, -1.73);
        let destination = offset(origin, 30.0, 40.0);
        let route = find_route(
            &FootpathGraph::new(),
            origin,
            destination,
            &FootpathConfig::default(),
        )
        .unwrap();

        assert!(route.degraded);
        assert_eq!(route.points, vec![origin, destination]);
        assert!((route.distance_m - 50.0).abs() < 0.01);
        assert_eq!(route.stats.fallback, Some(FallbackReason::EmptyGraph));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let (graph, start) = straight_path();
        let result = find_route(
            &graph,
            LatLng::new(f64::NAN, 0.0),
            start,
            &FootpathConfig::default(),
        );
        assert!(matches!(result, Err(Error::InvalidCoordinate { .. })));
    }

    #[test]
    fn invalid_walking_speed_is_rejected() {
        let (graph, start) = straight_path();
        let mut config = FootpathConfig::default();
        config.route.walking_speed_mps = -1.0;
        let result = find_route(&graph, start, offset(start, 0.0, 50.0), &config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn querying_leaves_graph_unchanged() {
        let (graph, start) = straight_path();
        let nodes = graph.node_count();
        let edges = graph.edge_count();

        find_route(
            &graph,
            offset(start, 3.0, 10.0),
            offset(start, 3.0, 90.0),
            &FootpathConfig::default(),
        )
        .unwrap();

        assert_eq!(graph.node_count(), nodes);
        assert_eq!(graph.edge_count(), edges);
    }

    #[test]
    fn identical_points_collapse() {
        let (graph, start) = straight_path();
        let point = offset(start, 0.0, 30.0);
        let route = find_route(&graph, point, point, &FootpathConfig::default()).unwrap();
        assert_eq!(route.points, vec![point]);
        assert_eq!(route.distance_m, 0.0);
        assert!(route.initial_bearing().is_none());
    }

    #[test]
    fn zero_dedup_epsilon_still_collapses_identical_points() {
        let (graph, start) = straight_path();
        let point = offset(start, 0.0, 30.0);
        let mut config = FootpathConfig::default();
        config.route.dedup_epsilon_deg = 0.0;

        let route = find_route(&graph, point, point, &config).unwrap();
        assert_eq!(route.points, vec![point]);
        assert_eq!(route.distance_m, 0.0);
    }

    #[test]
    fn geojson_export_uses_lng_lat() {
        let (graph, start) = straight_path();
        let route = find_route(
            &graph,
            start,
            offset(start, 0.0, 100.0),
            &FootpathConfig::default(),
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&route.to_geojson_string().unwrap()).unwrap();
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"][0], json!([start.lng, start.lat]));
        assert_eq!(value["properties"]["degraded"], json!(false));

        let bearing = route.initial_bearing().unwrap();
        assert!((bearing - 90.0).abs() < 0.1, "{bearing}");
    }
}
