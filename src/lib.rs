use pyo3::prelude::*;
use pyo3_stub_gen::define_stub_info_gatherer;

use graph::{PyFootpathGraph, create_footpath_graph, load_footpath_graph};
use routing::{
    find_route, find_route_geojson, find_routes_one_to_many, find_tour, route_progress,
};

mod convert;
pub mod graph;
pub mod routing;

/// A Python module implemented in Rust.
#[pymodule]
fn footpath(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyFootpathGraph>()?;
    m.add_function(wrap_pyfunction!(load_footpath_graph, m)?)?;
    m.add_function(wrap_pyfunction!(create_footpath_graph, m)?)?;

    m.add_function(wrap_pyfunction!(find_route, m)?)?;
    m.add_function(wrap_pyfunction!(find_route_geojson, m)?)?;
    m.add_function(wrap_pyfunction!(find_routes_one_to_many, m)?)?;
    m.add_function(wrap_pyfunction!(find_tour, m)?)?;
    m.add_function(wrap_pyfunction!(route_progress, m)?)?;
    Ok(())
}

define_stub_info_gatherer!(stub_info);
