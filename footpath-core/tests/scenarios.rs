use footpath_core::routing::shortest_path;
use footpath_core::{
    EARTH_RADIUS_M, EdgeKind, FootpathConfig, FootpathGraph, LatLng, PathFeature, RepairConfig,
    build_footpath_graph, find_route, haversine_meters, parse_footpaths_geojson, snap_point,
};

fn offset(origin: LatLng, north_m: f64, east_m: f64) -> LatLng {
    let d_lat = (north_m / EARTH_RADIUS_M).to_degrees();
    let d_lng = (east_m / (EARTH_RADIUS_M * origin.lat.to_radians().cos())).to_degrees();
    LatLng::new(origin.lat + d_lat, origin.lng + d_lng)
}

fn path(label: &str, points: &[LatLng]) -> PathFeature {
    PathFeature::new(label, points.to_vec())
}

fn build(features: &[PathFeature]) -> FootpathGraph {
    build_footpath_graph(features, &RepairConfig::default()).0
}

/// A 4x4 block of streets, 50 m apart, with one diagonal shortcut
fn street_grid(origin: LatLng) -> Vec<PathFeature> {
    let mut features = Vec::new();
    for i in 0..4 {
        let row: Vec<LatLng> = (0..4)
            .map(|j| offset(origin, f64::from(i) * 50.0, f64::from(j) * 50.0))
            .collect();
        features.push(path(&format!("row{i}"), &row));
        let column: Vec<LatLng> = (0..4)
            .map(|j| offset(origin, f64::from(j) * 50.0, f64::from(i) * 50.0))
            .collect();
        features.push(path(&format!("col{i}"), &column));
    }
    features.push(path(
        "diagonal",
        &[offset(origin, 0.0, 0.0), offset(origin, 50.0, 50.0)],
    ));
    features
}

#[test]
fn shared_endpoint_is_one_node() {
    let shared = LatLng::new(52.7300, -1.7300);
    let graph = build(&[
        path("a", &[offset(shared, 0.0, -30.0), shared]),
        path("b", &[shared, offset(shared, 30.0, 0.0)]),
    ]);

    let at_shared: Vec<_> = graph.nodes().iter().filter(|n| n.position == shared).collect();
    assert_eq!(at_shared.len(), 1);
    assert_eq!(graph.degree(at_shared[0].id), 2);
}

#[test]
fn endpoints_within_tolerance_are_bridged_in_pass_one() {
    let start = LatLng::new(52.73, -1.73);
    let end = offset(start, 0.0, 20.0);
    let next = offset(end, 0.0, 1.5);
    let (graph, stats) = build_footpath_graph(
        &[path("a", &[start, end]), path("b", &[next, offset(next, 0.0, 20.0)])],
        &RepairConfig::default(),
    );

    assert_eq!(stats.components_before_repair, 2);
    assert_eq!(stats.endpoint_bridges, 1);
    assert_eq!(stats.component_bridges, 0);
    assert_eq!(stats.components_after_repair, 1);
    assert_eq!(graph.edge_count_of(EdgeKind::ToleranceBridge), 1);
}

#[test]
fn wider_gap_is_bridged_in_pass_two() {
    let start = LatLng::new(52.73, -1.73);
    let end = offset(start, 0.0, 20.0);
    let next = offset(end, 0.0, 3.0);
    let (graph, stats) = build_footpath_graph(
        &[path("a", &[start, end]), path("b", &[next, offset(next, 0.0, 20.0)])],
        &RepairConfig::default(),
    );

    assert_eq!(stats.endpoint_bridges, 0);
    assert_eq!(stats.component_bridges, 1);
    let bridge = graph
        .nodes()
        .iter()
        .flat_map(|n| graph.edges(n.id))
        .find(|e| e.kind == EdgeKind::ComponentBridge)
        .unwrap();
    assert!((bridge.weight - 3.0).abs() < 0.01);
}

#[test]
fn route_between_segment_ends_follows_segment() {
    let start = LatLng::new(52.73, -1.73);
    let end = offset(start, 0.0, 40.0);
    let graph = build(&[path("only", &[start, end])]);

    let route = find_route(&graph, start, end, &FootpathConfig::default()).unwrap();
    assert!(!route.degraded);
    assert!((route.distance_m - 40.0).abs() < 0.1, "{}", route.distance_m);
}

#[test]
fn island_beyond_max_hop_degrades() {
    let start = LatLng::new(52.73, -1.73);
    let end = offset(start, 0.0, 40.0);
    let island_start = offset(end, 0.0, 50.0);
    let island_end = offset(island_start, 0.0, 20.0);
    let graph = build(&[
        path("main", &[start, end]),
        path("island", &[island_start, island_end]),
    ]);
    assert_eq!(graph.component_count(), 2);

    let destination = offset(island_start, 0.0, 10.0);
    let route = find_route(&graph, start, destination, &FootpathConfig::default()).unwrap();

    assert!(route.degraded);
    assert_eq!(route.points, vec![start, destination]);
    assert!((route.distance_m - haversine_meters(start, destination)).abs() < 1e-9);
    assert!(route.stats.fallback.is_some());
}

#[test]
fn island_within_max_hop_is_patched() {
    let start = LatLng::new(52.73, -1.73);
    let end = offset(start, 0.0, 40.0);
    let island_start = offset(end, 0.0, 15.0);
    let island_end = offset(island_start, 0.0, 20.0);
    let graph = build(&[
        path("main", &[start, end]),
        path("island", &[island_start, island_end]),
    ]);
    assert_eq!(graph.component_count(), 2);

    let route = find_route(&graph, start, island_end, &FootpathConfig::default()).unwrap();

    assert!(!route.degraded);
    assert_eq!(route.stats.heuristic_hops, 1);
    assert!((route.distance_m - 75.0).abs() < 0.1, "{}", route.distance_m);
    // The durable graph never sees the hop
    assert_eq!(graph.edge_count_of(EdgeKind::QueryHop), 0);
}

#[test]
fn empty_geometry_gives_straight_line() {
    let features =
        parse_footpaths_geojson(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
    let (graph, stats) = build_footpath_graph(&features, &RepairConfig::default());
    assert!(graph.is_empty());
    assert_eq!(stats.nodes, 0);

    let origin = LatLng::new(52.73, -1.73);
    let destination = offset(origin, 100.0, 0.0);
    let route = find_route(&graph, origin, destination, &FootpathConfig::default()).unwrap();
    assert!(route.degraded);
    assert_eq!(route.points.len(), 2);
}

#[test]
fn edges_are_symmetric_and_non_negative() {
    let graph = build(&street_grid(LatLng::new(52.73, -1.73)));
    for node in graph.nodes() {
        for edge in graph.edges(node.id) {
            assert!(edge.weight >= 0.0);
            let back = graph.edge(edge.to, node.id).unwrap();
            assert_eq!(back.weight, edge.weight);
        }
    }
}

#[test]
fn build_is_idempotent() {
    let features = street_grid(LatLng::new(52.73, -1.73));
    let first = build(&features);
    let second = build(&features);

    let positions = |g: &FootpathGraph| g.nodes().iter().map(|n| n.position).collect::<Vec<_>>();
    assert_eq!(positions(&first), positions(&second));
    assert_eq!(first.edge_count(), second.edge_count());
    assert_eq!(first.total_edge_weight(), second.total_edge_weight());
}

#[test]
fn shortest_path_beats_every_simple_path() {
    let graph = build(&street_grid(LatLng::new(52.73, -1.73)));
    let source = 0;
    let target = graph.node_count() - 1;
    let best = shortest_path(&graph, source, target).unwrap();

    // Exhaustive search over simple paths in a 16-node graph
    let mut cheapest = f64::INFINITY;
    let mut stack = vec![(source, 0.0, vec![source])];
    while let Some((node, cost, visited)) = stack.pop() {
        if node == target {
            cheapest = cheapest.min(cost);
            continue;
        }
        for edge in graph.edges(node) {
            if !visited.contains(&edge.to) {
                let mut next = visited.clone();
                next.push(edge.to);
                stack.push((edge.to, cost + edge.weight, next));
            }
        }
    }

    assert!((best.cost - cheapest).abs() < 1e-9);
    let walked: f64 = best
        .nodes
        .windows(2)
        .map(|w| graph.edge(w[0], w[1]).unwrap().weight)
        .sum();
    assert!((walked - best.cost).abs() < 1e-9);
}

#[test]
fn degenerate_features_are_harmless() {
    let p = LatLng::new(52.73, -1.73);
    let (graph, stats) = build_footpath_graph(
        &[path("single", &[p]), path("repeated", &[p, p]), path("empty", &[])],
        &RepairConfig::default(),
    );
    assert_eq!(stats.skipped_features, 2);
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.edge(0, 0).is_none());
}

#[test]
fn snap_distance_shrinks_towards_segment() {
    let start = LatLng::new(52.73, -1.73);
    let graph = build(&[path("only", &[start, offset(start, 0.0, 100.0)])]);

    let distances: Vec<f64> = [40.0, 20.0, 10.0, 5.0, 0.0]
        .iter()
        .map(|&north| snap_point(&graph, offset(start, north, 50.0)).unwrap().distance_m())
        .collect();
    assert!(distances.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn geojson_to_route() {
    let text = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "north"},
             "geometry": {"type": "LineString", "coordinates": [[-1.7300, 52.7300], [-1.7300, 52.7310]]}},
            {"type": "Feature", "properties": {"name": "east"},
             "geometry": {"type": "LineString", "coordinates": [[-1.7300, 52.7310], [-1.7285, 52.7310]]}}
        ]
    }"#;
    let features = parse_footpaths_geojson(text).unwrap();
    let graph = build(&features);
    assert_eq!(graph.node_count(), 3);

    let origin = LatLng::new(52.7300, -1.7300);
    let destination = LatLng::new(52.7310, -1.7285);
    let route = find_route(&graph, origin, destination, &FootpathConfig::default()).unwrap();

    assert!(!route.degraded);
    let expected = haversine_meters(origin, LatLng::new(52.7310, -1.7300))
        + haversine_meters(LatLng::new(52.7310, -1.7300), destination);
    assert!((route.distance_m - expected).abs() < 0.1);
}
