//! Tracking a live position along a computed route

use itertools::Itertools;
use serde::Serialize;

use super::route::{Route, polyline_length};
use crate::{Error, LatLng, Meters, RouteConfig, haversine_meters, project_point_onto_segment};

/// Where a walker is relative to a route
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteProgress {
    /// Closest point on the route polyline
    pub nearest: LatLng,
    pub distance_to_route: Meters,
    /// Remaining length from `nearest` to the destination
    pub distance_remaining: Meters,
    /// Index of the polyline leg holding `nearest`
    pub segment_index: usize,
    pub off_route: bool,
}

impl Route {
    /// Locates `position` on the route. Returns `None` for a route without
    /// points.
    pub fn progress(&self, position: LatLng, config: &RouteConfig) -> Option<RouteProgress> {
        locate(&self.points, position, config.off_route_threshold_m)
    }
}

/// Locates `position` on a route polyline held by the caller, such as the
/// `points` of a route returned earlier.
///
/// # Errors
///
/// Returns [`Error::InvalidCoordinate`] if `position` or any route point is
/// not finite.
pub fn route_progress(
    points: &[LatLng],
    position: LatLng,
    config: &RouteConfig,
) -> Result<Option<RouteProgress>, Error> {
    if let Some(bad) = std::iter::once(&position).chain(points).find(|p| !p.is_finite()) {
        return Err(Error::InvalidCoordinate {
            lat: bad.lat,
            lng: bad.lng,
        });
    }
    Ok(locate(points, position, config.off_route_threshold_m))
}

fn locate(points: &[LatLng], position: LatLng, off_route_m: Meters) -> Option<RouteProgress> {
    let first = *points.first()?;
    if points.len() == 1 {
        let distance_to_route = haversine_meters(position, first);
        return Some(RouteProgress {
            nearest: first,
            distance_to_route,
            distance_remaining: 0.0,
            segment_index: 0,
            off_route: distance_to_route > off_route_m,
        });
    }

    let (segment_index, nearest) = points
        .iter()
        .tuple_windows()
        .map(|(a, b)| project_point_onto_segment(position, *a, *b))
        .enumerate()
        .min_by(|(_, x), (_, y)| x.distance_m.total_cmp(&y.distance_m))
        .map(|(index, projection)| (index, projection.point))?;

    let segment_end = points[segment_index + 1];
    let distance_remaining = haversine_meters(nearest, segment_end)
        + polyline_length(&points[segment_index + 1..]);
    let distance_to_route = haversine_meters(position, nearest);

    Some(RouteProgress {
        nearest,
        distance_to_route,
        distance_remaining,
        segment_index,
        off_route: distance_to_route > off_route_m,
    })
}
