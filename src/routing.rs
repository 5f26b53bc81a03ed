use footpath_core::prelude::*;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3_stub_gen::derive::gen_stub_pyfunction;

use crate::convert::{lat_lng_tuples, route_to_py};
use crate::graph::PyFootpathGraph;

fn to_lat_lng((lat, lng): (f64, f64)) -> LatLng {
    LatLng::new(lat, lng)
}

fn routing_error(e: Error) -> PyErr {
    match e {
        Error::InvalidCoordinate { .. } | Error::InvalidQuery(_) | Error::InvalidConfig(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid route query: {e}"))
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
            "Route calculation failed: {e}"
        )),
    }
}

/// Find a walking route between two points
///
/// Parameters
/// ----------
/// graph : FootpathGraph
/// origin : tuple[float, float]
///     ``(lat, lon)`` of the start
/// destination : tuple[float, float]
///     ``(lat, lon)`` of the end
///
/// Returns
/// -------
/// dict
///     ``points`` as ``(lat, lon)`` tuples from origin to destination,
///     ``distance_m``, ``duration_s``, ``initial_bearing``, ``stats`` and
///     ``degraded``, which is set when no network path was found and the
///     route is a straight line.
#[gen_stub_pyfunction]
#[pyfunction]
pub fn find_route(
    py: Python<'_>,
    graph: &PyFootpathGraph,
    origin: (f64, f64),
    destination: (f64, f64),
) -> PyResult<Py<PyAny>> {
    let route = py
        .detach(|| {
            footpath_core::find_route(
                &graph.graph,
                to_lat_lng(origin),
                to_lat_lng(destination),
                &graph.config,
            )
        })
        .map_err(routing_error)?;

    route_to_py(py, &route)
}

/// Find a walking route and return it as a GeoJSON ``Feature`` string
#[gen_stub_pyfunction]
#[pyfunction]
pub fn find_route_geojson(
    py: Python<'_>,
    graph: &PyFootpathGraph,
    origin: (f64, f64),
    destination: (f64, f64),
) -> PyResult<String> {
    py.detach(|| {
        footpath_core::find_route(
            &graph.graph,
            to_lat_lng(origin),
            to_lat_lng(destination),
            &graph.config,
        )
        .and_then(|route| route.to_geojson_string())
    })
    .map_err(routing_error)
}

/// Find walking routes from one origin to many destinations
///
/// Destinations are routed in parallel. The result list follows the order of
/// ``destinations``.
#[gen_stub_pyfunction]
#[pyfunction]
pub fn find_routes_one_to_many(
    py: Python<'_>,
    graph: &PyFootpathGraph,
    origin: (f64, f64),
    destinations: Vec<(f64, f64)>,
) -> PyResult<Vec<Py<PyAny>>> {
    let destinations: Vec<LatLng> = destinations.into_iter().map(to_lat_lng).collect();

    let results = py.detach(|| {
        footpath_core::find_routes_one_to_many(
            &graph.graph,
            to_lat_lng(origin),
            &destinations,
            &graph.config,
        )
    });

    results
        .into_iter()
        .map(|result| result.map_err(routing_error).and_then(|route| route_to_py(py, &route)))
        .collect()
}

/// Find a walking tour visiting ``stops`` in order
///
/// Returns
/// -------
/// dict
///     ``points`` of the whole tour, total ``distance_m`` and ``duration_s``,
///     ``degraded`` if any leg is a straight line, and ``legs`` with one
///     route dictionary per consecutive pair of stops.
///
/// Raises
/// ------
/// ValueError
///     If fewer than two stops are given or a stop is not a finite coordinate
#[gen_stub_pyfunction]
#[pyfunction]
pub fn find_tour(
    py: Python<'_>,
    graph: &PyFootpathGraph,
    stops: Vec<(f64, f64)>,
) -> PyResult<Py<PyAny>> {
    let stops: Vec<LatLng> = stops.into_iter().map(to_lat_lng).collect();
    let tour = py
        .detach(|| footpath_core::find_tour(&graph.graph, &stops, &graph.config))
        .map_err(routing_error)?;

    let legs = tour
        .legs
        .iter()
        .map(|leg| route_to_py(py, leg))
        .collect::<PyResult<Vec<_>>>()?;

    let dict = PyDict::new(py);
    dict.set_item("points", lat_lng_tuples(&tour.points))?;
    dict.set_item("distance_m", tour.distance_m)?;
    dict.set_item("duration_s", tour.duration_s)?;
    dict.set_item("degraded", tour.degraded)?;
    dict.set_item("legs", legs)?;
    Ok(dict.into_any().unbind())
}

/// Locate a position along a route returned earlier
///
/// Parameters
/// ----------
/// graph : FootpathGraph
///     Graph whose configuration supplies the off-route threshold
/// points : list[tuple[float, float]]
///     ``points`` of a route, as ``(lat, lon)`` tuples
/// position : tuple[float, float]
///     Current ``(lat, lon)`` of the walker
///
/// Returns
/// -------
/// dict or None
///     ``nearest`` point on the route, ``distance_to_route``,
///     ``distance_remaining`` to the destination, ``segment_index`` and
///     ``off_route``. ``None`` if ``points`` is empty.
#[gen_stub_pyfunction]
#[pyfunction]
pub fn route_progress(
    py: Python<'_>,
    graph: &PyFootpathGraph,
    points: Vec<(f64, f64)>,
    position: (f64, f64),
) -> PyResult<Option<Py<PyAny>>> {
    let points: Vec<LatLng> = points.into_iter().map(to_lat_lng).collect();
    let progress =
        footpath_core::route_progress(&points, to_lat_lng(position), &graph.config.route)
            .map_err(routing_error)?;

    progress
        .map(|progress| {
            let dict = PyDict::new(py);
            dict.set_item("nearest", (progress.nearest.lat, progress.nearest.lng))?;
            dict.set_item("distance_to_route", progress.distance_to_route)?;
            dict.set_item("distance_remaining", progress.distance_remaining)?;
            dict.set_item("segment_index", progress.segment_index)?;
            dict.set_item("off_route", progress.off_route)?;
            Ok(dict.into_any().unbind())
        })
        .transpose()
}
