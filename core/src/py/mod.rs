use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::api;
use crate::error::EngineError;

fn to_py_err(e: EngineError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// JSON inn ({samples, config|preset, history?}) → JSON ut (rapport + innsikter).
#[pyfunction]
fn analyze_sessions_json(json_in: &str) -> PyResult<String> {
    api::analyze_json(json_in).map_err(to_py_err)
}

/// Tidsserie for én spiller + lagsnitt på en dato.
#[pyfunction]
fn session_timeline_json(json_in: &str) -> PyResult<String> {
    api::timeline_json(json_in).map_err(to_py_err)
}

#[pyfunction]
fn weight_presets_json() -> PyResult<String> {
    api::presets_json().map_err(to_py_err)
}

#[pymodule]
fn mdp_intensity_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_sessions_json, m)?)?;
    m.add_function(wrap_pyfunction!(session_timeline_json, m)?)?;
    m.add_function(wrap_pyfunction!(weight_presets_json, m)?)?;
    Ok(())
}
