use footpath_core::prelude::*;
use pyo3::IntoPyObjectExt;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Converts any serializable core value into plain Python objects
pub(crate) fn to_py_json<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<Py<PyAny>> {
    let value = serde_json::to_value(value).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("Serialization failed: {e}"))
    })?;
    json_to_py(py, &value)
}

fn json_to_py(py: Python<'_>, value: &JsonValue) -> PyResult<Py<PyAny>> {
    match value {
        JsonValue::Null => Ok(py.None()),
        JsonValue::Bool(b) => (*b).into_py_any(py),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.into_py_any(py),
            (None, Some(u)) => u.into_py_any(py),
            _ => n.as_f64().unwrap_or(f64::NAN).into_py_any(py),
        },
        JsonValue::String(s) => s.as_str().into_py_any(py),
        JsonValue::Array(items) => {
            let items = items
                .iter()
                .map(|item| json_to_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            Ok(PyList::new(py, items)?.into_any().unbind())
        }
        JsonValue::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            Ok(dict.into_any().unbind())
        }
    }
}

/// Converts a route into a Python dictionary
pub(crate) fn route_to_py(py: Python<'_>, route: &Route) -> PyResult<Py<PyAny>> {
    let dict = PyDict::new(py);
    dict.set_item("points", lat_lng_tuples(&route.points))?;
    dict.set_item("distance_m", route.distance_m)?;
    dict.set_item("duration_s", route.duration_s)?;
    dict.set_item("degraded", route.degraded)?;
    dict.set_item("initial_bearing", route.initial_bearing())?;
    dict.set_item("stats", to_py_json(py, &route.stats)?)?;
    Ok(dict.into_any().unbind())
}

pub(crate) fn lat_lng_tuples(points: &[LatLng]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p.lat, p.lng)).collect()
}
