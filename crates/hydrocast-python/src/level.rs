use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use hydrocast_core::forcing;
use hydrocast_core::level::{self, LevelStorageCurve};

use crate::convert::{checked_slice, contiguous_slice, value_error};

fn curve(levels: &PyReadonlyArray1<'_, f64>, storages: &PyReadonlyArray1<'_, f64>) -> PyResult<LevelStorageCurve> {
    LevelStorageCurve::new(contiguous_slice(levels)?.to_vec(), contiguous_slice(storages)?.to_vec())
        .map_err(value_error)
}

/// Storage [10^4 m3] at `level` [m].
#[pyfunction]
fn storage_at(levels: PyReadonlyArray1<'_, f64>, storages: PyReadonlyArray1<'_, f64>, level: f64) -> PyResult<f64> {
    Ok(curve(&levels, &storages)?.storage_at(level))
}

/// Level [m] at `storage` [10^4 m3].
#[pyfunction]
fn level_at(levels: PyReadonlyArray1<'_, f64>, storages: PyReadonlyArray1<'_, f64>, storage: f64) -> PyResult<f64> {
    Ok(curve(&levels, &storages)?.level_at(storage))
}

/// Integrate a discharge series into levels from the origin `n1`.
///
/// Steps before the origin come back as `-999`.
#[pyfunction]
#[pyo3(signature = (levels, storages, discharge, n1, start_level, inflow=None, outflow=None))]
#[allow(clippy::too_many_arguments)]
fn reconstruct<'py>(
    py: Python<'py>,
    levels: PyReadonlyArray1<'py, f64>,
    storages: PyReadonlyArray1<'py, f64>,
    discharge: PyReadonlyArray1<'py, f64>,
    n1: usize,
    start_level: f64,
    inflow: Option<PyReadonlyArray1<'py, f64>>,
    outflow: Option<PyReadonlyArray1<'py, f64>>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let curve = curve(&levels, &storages)?;
    let q = contiguous_slice(&discharge)?;
    let n = q.len();
    let zeros = vec![0.0; n];
    let inflow = match &inflow {
        Some(arr) => checked_slice(arr, n, "inflow")?,
        None => zeros.as_slice(),
    };
    let outflow = match &outflow {
        Some(arr) => checked_slice(arr, n, "outflow")?,
        None => zeros.as_slice(),
    };

    let levels = level::reconstruct(&curve, q, inflow, outflow, n1, start_level);
    Ok(PyArray1::from_vec(
        py,
        levels.into_iter().map(forcing::level_to_sentinel).collect(),
    ))
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "level")?;
    m.add_function(wrap_pyfunction!(storage_at, &m)?)?;
    m.add_function(wrap_pyfunction!(level_at, &m)?)?;
    m.add_function(wrap_pyfunction!(reconstruct, &m)?)?;
    parent.add_submodule(&m)?;
    Ok(())
}
