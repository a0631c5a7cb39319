use numpy::PyReadonlyArray1;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use hydrocast_core::forcing;
use hydrocast_core::metrics;

use crate::convert::{checked_slice, contiguous_slice};

macro_rules! score_fn {
    ($($name:ident),+ $(,)?) => {
        $(
            #[pyfunction]
            fn $name(observed: PyReadonlyArray1<'_, f64>, simulated: PyReadonlyArray1<'_, f64>) -> PyResult<f64> {
                let obs = contiguous_slice(&observed)?;
                let sim = checked_slice(&simulated, obs.len(), "simulated")?;
                Ok(metrics::$name(obs, sim))
            }
        )+
    };
}

score_fn!(nse, log_nse, kge, pbias, rmse, mae);

/// Score a forecast against sentinel-encoded observed inflow (`-1` = missing).
///
/// Returns `None` with fewer than two observed steps.
#[pyfunction]
fn paired_skill<'py>(
    py: Python<'py>,
    simulated: PyReadonlyArray1<'py, f64>,
    observed: PyReadonlyArray1<'py, f64>,
) -> PyResult<Option<Bound<'py, PyDict>>> {
    let sim = contiguous_slice(&simulated)?;
    let obs = forcing::observed_from_sentinel(checked_slice(&observed, sim.len(), "observed")?);
    match metrics::paired_skill(sim, &obs) {
        Some(skill) => Ok(Some(fluxes_to_dict!(py, skill, pairs, nse, kge, pbias, rmse, mae))),
        None => Ok(None),
    }
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "metrics")?;
    m.add_function(wrap_pyfunction!(nse, &m)?)?;
    m.add_function(wrap_pyfunction!(log_nse, &m)?)?;
    m.add_function(wrap_pyfunction!(kge, &m)?)?;
    m.add_function(wrap_pyfunction!(pbias, &m)?)?;
    m.add_function(wrap_pyfunction!(rmse, &m)?)?;
    m.add_function(wrap_pyfunction!(mae, &m)?)?;
    m.add_function(wrap_pyfunction!(paired_skill, &m)?)?;
    parent.add_submodule(&m)?;
    Ok(())
}
