//! Multi-stop tours and one-to-many queries

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use super::route::{QueryStats, Route, find_route};
use crate::model::FootpathGraph;
use crate::{Error, FootpathConfig, LatLng, Meters};

/// Route visiting an ordered list of stops
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourRoute {
    /// One route per consecutive pair of stops
    pub legs: Vec<Route>,
    /// All legs joined into a single polyline
    pub points: Vec<LatLng>,
    pub distance_m: Meters,
    pub duration_s: f64,
    /// Set if any leg fell back to a straight line
    pub degraded: bool,
}

/// Routes through `stops` in order. Legs are solved in parallel over the
/// shared graph.
///
/// # Errors
///
/// Returns [`Error::InvalidQuery`] for fewer than two stops, or the first
/// error any leg produced.
pub fn find_tour(
    graph: &FootpathGraph,
    stops: &[LatLng],
    config: &FootpathConfig,
) -> Result<TourRoute, Error> {
    if stops.len() < 2 {
        return Err(Error::InvalidQuery(format!(
            "a tour needs at least two stops, got {}",
            stops.len()
        )));
    }
    let config = config.validated()?;

    let legs = stops
        .par_windows(2)
        .map(|pair| find_route(graph, pair[0], pair[1], &config))
        .collect::<Result<Vec<_>, _>>()?;

    let joined = Route::from_points(
        legs.iter().flat_map(|leg| leg.points.iter().copied()),
        false,
        QueryStats::default(),
        &config.route,
    );
    let degraded = legs.iter().any(|leg| leg.degraded);
    let distance_m: Meters = legs.iter().map(|leg| leg.distance_m).sum();

    info!(
        "Tour over {} stops: {:.1} m, {} degraded legs",
        stops.len(),
        distance_m,
        legs.iter().filter(|leg| leg.degraded).count()
    );

    Ok(TourRoute {
        points: joined.points,
        distance_m,
        duration_s: distance_m / config.route.walking_speed_mps,
        degraded,
        legs,
    })
}

/// Routes from `origin` to each of `destinations` in parallel, preserving
/// their order. Each result stands alone, so one bad destination does not
/// fail the others.
pub fn find_routes_one_to_many(
    graph: &FootpathGraph,
    origin: LatLng,
    destinations: &[LatLng],
    config: &FootpathConfig,
) -> Vec<Result<Route, Error>> {
    destinations
        .par_iter()
        .map(|&destination| find_route(graph, origin, destination, config))
        .collect()
}
