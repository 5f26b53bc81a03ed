//! Attaching arbitrary coordinates to the footpath graph

use log::debug;

use crate::model::{FootpathGraph, Segment};
use crate::{LatLng, Meters, NodeId, project_point_onto_segment};

/// Best attachment point of a query coordinate. Lives for one query only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapResult {
    /// Attached directly to an existing node
    Node { node: NodeId, distance_m: Meters },
    /// Attached to the perpendicular foot on a segment
    Segment {
        segment: Segment,
        point: LatLng,
        distance_m: Meters,
        /// Fraction along `segment.a -> segment.b`
        t: f64,
    },
}

impl SnapResult {
    /// Off-network distance between the query point and the attachment
    pub fn distance_m(&self) -> Meters {
        match self {
            SnapResult::Node { distance_m, .. } | SnapResult::Segment { distance_m, .. } => {
                *distance_m
            }
        }
    }

    /// Position of the attachment point
    pub fn point(&self, graph: &FootpathGraph) -> Option<LatLng> {
        match self {
            SnapResult::Node { node, .. } => graph.position(*node),
            SnapResult::Segment { point, .. } => Some(*point),
        }
    }

    /// Weight between two segment snaps lying on the same physical segment
    pub(crate) fn offset_along_shared_segment(&self, other: &SnapResult) -> Option<Meters> {
        let (
            SnapResult::Segment {
                segment: first,
                t: t1,
                ..
            },
            SnapResult::Segment {
                segment: second,
                t: t2,
                ..
            },
        ) = (self, other)
        else {
            return None;
        };

        if !first.same_nodes(second) {
            return None;
        }
        // Same nodes in reverse order measure t from the other end
        let t2 = if first.a == second.a { *t2 } else { 1.0 - *t2 };
        Some((t1 - t2).abs() * first.length)
    }
}

/// Finds where `query` attaches to the graph.
///
/// A segment projection that lands strictly within its segment is preferred
/// over the nearest node, since mid-path attachment is normally closer to
/// what a walker would do. The nearest node is used only when no segment
/// admits a perpendicular foot. Returns `None` for an empty graph.
pub fn snap_point(graph: &FootpathGraph, query: LatLng) -> Option<SnapResult> {
    let mut best_segment: Option<SnapResult> = None;

    for segment in graph.segments() {
        let projection = project_point_onto_segment(query, segment.a_position, segment.b_position);
        if !projection.on_segment {
            continue;
        }
        if best_segment.is_none_or(|best| projection.distance_m < best.distance_m()) {
            best_segment = Some(SnapResult::Segment {
                segment: *segment,
                point: projection.point,
                distance_m: projection.distance_m,
                t: projection.t,
            });
        }
    }

    if let Some(snap) = best_segment {
        debug!(
            "Snapped ({:.6}, {:.6}) onto segment {:?}, {:.1} m off path",
            query.lat,
            query.lng,
            snap_segment_nodes(&snap),
            snap.distance_m()
        );
        return Some(snap);
    }

    let (node, distance_m) = graph.nearest_node(query)?;
    debug!(
        "Snapped ({:.6}, {:.6}) onto node {node}, {distance_m:.1} m off path",
        query.lat, query.lng
    );
    Some(SnapResult::Node { node, distance_m })
}

fn snap_segment_nodes(snap: &SnapResult) -> Option<(NodeId, NodeId)> {
    match snap {
        SnapResult::Segment { segment, .. } => Some((segment.a, segment.b)),
        SnapResult::Node { .. } => None,
    }
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

    fn l_shaped() -> (FootpathGraph, LatLng) {
        let corner = LatLng::new(52.73, -1.73);
        let mut builder = GraphBuilder::new();
        builder.add_path(&[offset(corner, 0.0, -40.0), corner, offset(corner, 40.0, 0.0)]);
        (builder.finish(), corner)
    }

    #[test]
    fn prefers_segment_projection() {
        let (graph, corner) = l_shaped();
        let query = offset(corner, -5.0, -20.0);
        let snap = snap_point(&graph, query).unwrap();

        match snap {
            SnapResult::Segment { t, distance_m, .. } => {
                assert!((t - 0.5).abs() < 0.01, "t = {t}");
                assert!((distance_m - 5.0).abs() < 0.05, "distance = {distance_m}");
            }
            SnapResult::Node { .. } => panic!("expected segment snap"),
        }
    }

    #[test]
    fn falls_back_to_node_outside_every_segment() {
        let (graph, corner) = l_shaped();
        // South-east of the corner, beyond the end of both segments
        let query = offset(corner, -3.0, 3.0);
        let snap = snap_point(&graph, query).unwrap();

        assert!(matches!(snap, SnapResult::Node { node: 1, .. }));
        assert!((snap.distance_m() - 18.0_f64.sqrt()).abs() < 0.01);
    }

    #[test]
    fn isolated_point_snaps_to_node() {
        let mut builder = GraphBuilder::new();
        let p = LatLng::new(52.73, -1.73);
        builder.add_path(&[p, p]);
        let graph = builder.finish();

        let snap = snap_point(&graph, offset(p, 10.0, 0.0)).unwrap();
        assert!(matches!(snap, SnapResult::Node { node: 0, .. }));
    }

    #[test]
    fn empty_graph_has_no_snap() {
        assert!(snap_point(&FootpathGraph::new(), LatLng::new(52.73, -1.73)).is_none());
    }

    #[test]
    fn snap_distance_is_monotonic_towards_segment() {
        let (graph, corner) = l_shaped();
        let mut last = f64::INFINITY;
        for step in (0..=10).rev() {
            let query = offset(corner, -f64::from(step), -20.0);
            let d = snap_point(&graph, query).unwrap().distance_m();
            assert!(d <= last + 1e-9, "{d} > {last}");
            last = d;
        }
    }

    #[test]
    fn shared_segment_offset_handles_reversed_segments() {
        let (graph, _) = l_shaped();
        let segment = graph.segments()[0];
        let reversed = Segment {
            a: segment.b,
            b: segment.a,
            a_position: segment.b_position,
            b_position: segment.a_position,
            ..segment
        };
        let first = SnapResult::Segment {
            segment,
            point: segment.a_position,
            distance_m: 0.0,
            t: 0.25,
        };
        let second = SnapResult::Segment {
            segment: reversed,
            point: segment.a_position,
            distance_m: 0.0,
            t: 0.25,
        };

        let offset = first.offset_along_shared_segment(&second).unwrap();
        assert!((offset - 0.5 * segment.length).abs() < 1e-9);
    }
}
