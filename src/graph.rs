use std::path::PathBuf;

use footpath_core::prelude::*;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};

use crate::convert::to_py_json;

/// FootpathGraph
///
/// A walking network built from footpath polylines. Small gaps between paths
/// are bridged during construction so that surveyed paths which almost meet
/// are routable.
///
/// The graph is immutable once built and can be shared between threads; every
/// route query works on its own private copy.
///
/// Example:
///
/// .. code-block:: python
///
///     graph = load_footpath_graph("paths.geojson")
///     route = find_route(graph, (52.7300, -1.7300), (52.7312, -1.7281))
#[gen_stub_pyclass]
#[pyclass(name = "FootpathGraph", frozen)]
pub struct PyFootpathGraph {
    pub(crate) graph: FootpathGraph,
    pub(crate) stats: BuildStats,
    pub(crate) config: FootpathConfig,
}

#[gen_stub_pymethods]
#[pymethods]
impl PyFootpathGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn component_count(&self) -> usize {
        self.graph.component_count()
    }

    /// Build statistics: node and edge counts, components before and after
    /// repair, bridges added by each repair pass
    pub fn stats(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        to_py_json(py, &self.stats)
    }

    fn __repr__(&self) -> String {
        format!(
            "FootpathGraph with {} nodes, {} edges and {} components",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.graph.component_count()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Starts from `config`, a dict shaped like the server's `[engine]` table,
/// then applies the explicit keyword overrides
fn engine_config(
    py: Python<'_>,
    config: Option<&Bound<'_, PyDict>>,
    endpoint_tolerance_m: Option<f64>,
    component_bridge_max_m: Option<f64>,
    max_hop_m: Option<f64>,
    walking_speed_mps: Option<f64>,
) -> PyResult<FootpathConfig> {
    let mut engine = match config {
        Some(dict) => {
            let text: String = PyModule::import(py, "json")?
                .call_method1("dumps", (dict,))?
                .extract()?;
            serde_json::from_str::<FootpathConfig>(&text).map_err(invalid_config)?
        }
        None => FootpathConfig::default(),
    };

    if let Some(value) = endpoint_tolerance_m {
        engine.repair.endpoint_tolerance_m = value;
    }
    if let Some(value) = component_bridge_max_m {
        engine.repair.component_bridge_max_m = value;
    }
    if let Some(value) = max_hop_m {
        engine.patch.max_hop_m = value;
    }
    if let Some(value) = walking_speed_mps {
        engine.route.walking_speed_mps = value;
    }

    engine.validated().map_err(invalid_config)
}

fn invalid_config(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid configuration: {e}"))
}

fn build(features: &[PathFeature], config: FootpathConfig) -> PyFootpathGraph {
    let (graph, stats) = build_footpath_graph(features, &config.repair);
    PyFootpathGraph {
        graph,
        stats,
        config,
    }
}

/// Build a footpath graph from a GeoJSON file
///
/// Parameters
/// ----------
/// path : str
///     GeoJSON file with ``LineString`` or ``MultiLineString`` features
/// endpoint_tolerance_m : float, default=2.0
///     Path endpoints closer than this are joined. Clamped to [0, 20].
/// component_bridge_max_m : float, default=6.0
///     Disconnected parts of the network closer than this are joined
/// max_hop_m : float, default=25.0
///     Longest off-network hop a route query may add to reach its destination
/// walking_speed_mps : float, default=1.4
///     Walking speed used for route durations
/// config : dict, optional
///     Every engine tunable, nested as ``repair``, ``patch`` and ``route``
///     like the server's ``[engine]`` table, for example
///     ``{"patch": {"hop_penalty": 3.0, "target_bias": 0.5}}``. Missing
///     fields use their defaults; the keyword arguments above take
///     precedence.
///
/// Returns
/// -------
/// FootpathGraph
///
/// Raises
/// ------
/// RuntimeError
///     If the file cannot be read or is not JSON
/// ValueError
///     If the walking speed is not positive or ``config`` has a field of the
///     wrong type
///
/// Notes
/// -----
/// The function releases the GIL while loading and building.
#[gen_stub_pyfunction]
#[pyfunction]
#[pyo3(signature = (
    path,
    endpoint_tolerance_m = None,
    component_bridge_max_m = None,
    max_hop_m = None,
    walking_speed_mps = None,
    config = None,
))]
pub fn load_footpath_graph(
    py: Python<'_>,
    path: &str,
    endpoint_tolerance_m: Option<f64>,
    component_bridge_max_m: Option<f64>,
    max_hop_m: Option<f64>,
    walking_speed_mps: Option<f64>,
    config: Option<&Bound<'_, PyDict>>,
) -> PyResult<PyFootpathGraph> {
    let config = engine_config(
        py,
        config,
        endpoint_tolerance_m,
        component_bridge_max_m,
        max_hop_m,
        walking_speed_mps,
    )?;
    let path = PathBuf::from(path);

    py.detach(|| {
        let features = load_footpaths_geojson(&path).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to load footpaths: {e}"
            ))
        })?;
        Ok(build(&features, config))
    })
}

/// Build a footpath graph from in-memory polylines
///
/// Parameters
/// ----------
/// paths : list[list[tuple[float, float]]]
///     Each path is a list of ``(lat, lon)`` vertices. Paths with fewer than
///     two usable vertices are skipped.
///
/// Other parameters are the same as for :func:`load_footpath_graph`.
#[gen_stub_pyfunction]
#[pyfunction]
#[pyo3(signature = (
    paths,
    endpoint_tolerance_m = None,
    component_bridge_max_m = None,
    max_hop_m = None,
    walking_speed_mps = None,
    config = None,
))]
pub fn create_footpath_graph(
    py: Python<'_>,
    paths: Vec<Vec<(f64, f64)>>,
    endpoint_tolerance_m: Option<f64>,
    component_bridge_max_m: Option<f64>,
    max_hop_m: Option<f64>,
    walking_speed_mps: Option<f64>,
    config: Option<&Bound<'_, PyDict>>,
) -> PyResult<PyFootpathGraph> {
    let config = engine_config(
        py,
        config,
        endpoint_tolerance_m,
        component_bridge_max_m,
        max_hop_m,
        walking_speed_mps,
    )?;

    let features: Vec<PathFeature> = paths
        .into_iter()
        .enumerate()
        .map(|(i, vertices)| {
            let coordinates = vertices
                .into_iter()
                .map(|(lat, lng)| LatLng::new(lat, lng))
                .collect();
            PathFeature::new(format!("path{i}"), coordinates)
        })
        .collect();

    Ok(py.detach(|| build(&features, config)))
}
