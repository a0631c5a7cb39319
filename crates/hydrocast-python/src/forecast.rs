use std::collections::BTreeMap;

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use hydrocast_core::confluence::{self, RoutedFlowSeries};
use hydrocast_core::forcing::{self, Forcing};
use hydrocast_core::level::LevelStorageCurve;
use hydrocast_core::partition;
use hydrocast_core::pipeline::{self, Forecast, ForecastInput, GeneratorKind, InitialConditions};
use hydrocast_core::soil_moisture::constants::STATE_SIZE;
use hydrocast_core::soil_moisture::params::Parameters as SoilParameters;
use hydrocast_core::soil_moisture::run::{self as soil_run, SoilMoistureGenerator};
use hydrocast_core::soil_moisture::state::State as SoilState;
use hydrocast_core::traits::RunoffGenerator;
use hydrocast_core::{HydrocastConfig, ReservoirKind};

use crate::convert::{
    checked_slice, contiguous_slice, hourly_series, optional_slice, parse_time, value_error, TIME_FORMAT,
};

define_series_result! {
    pub struct RoutedFlowResult from RoutedFlowSeries {
        surface, interflow, groundwater, discharge,
    }
}

fn load_config(config_json: Option<&str>) -> PyResult<HydrocastConfig> {
    match config_json {
        Some(json) => HydrocastConfig::from_json_str(json).map_err(value_error),
        None => Ok(HydrocastConfig::default()),
    }
}

fn forecast_to_dict<'py>(py: Python<'py>, forecast: &Forecast) -> PyResult<Bound<'py, PyDict>> {
    let stored: Vec<_> = forecast.records.iter().map(|r| r.storage_view()).collect();
    let time: Vec<String> = stored.iter().map(|r| r.time.format(TIME_FORMAT).to_string()).collect();

    let dict = PyDict::new(py);
    dict.set_item("reservoir", forecast.reservoir.code())?;
    dict.set_item("generator", forecast.generator.code())?;
    dict.set_item("time", time)?;
    dict.set_item(
        "discharge",
        PyArray1::from_vec(py, stored.iter().map(|r| r.discharge).collect()),
    )?;
    dict.set_item(
        "level_rainfall_only",
        PyArray1::from_vec(py, stored.iter().map(|r| r.level_rainfall_only).collect()),
    )?;
    dict.set_item(
        "level_full",
        PyArray1::from_vec(py, stored.iter().map(|r| r.level_full).collect()),
    )?;
    dict.set_item("runoff_depth", PyArray1::from_vec(py, forecast.runoff_depth.clone()))?;
    dict.set_item("routed_discharge", PyArray1::from_vec(py, forecast.routed_discharge.clone()))?;
    dict.set_item("flood", format!("{:?}", forecast.flood).to_lowercase())?;
    dict.set_item("offset_variant", format!("{:?}", forecast.offset_variant).to_lowercase())?;
    dict.set_item("anchors", forecast.anchors.clone())?;
    match forecast.skill {
        Some(skill) => {
            let s = fluxes_to_dict!(py, skill, pairs, nse, kge, pbias, rmse, mae);
            dict.set_item("skill", s)?;
        }
        None => dict.set_item("skill", py.None())?,
    }
    match forecast.antecedent {
        Some(summary) => {
            let a = fluxes_to_dict!(py, summary, pa, decay);
            dict.set_item("antecedent", a)?;
        }
        None => dict.set_item("antecedent", py.None())?,
    }
    Ok(dict)
}

/// Run one forecast.
///
/// `observed` uses `-1` for missing samples; returned levels use `-999` for
/// steps before the origin. Daily antecedent totals are taken from
/// `daily_rainfall`, or aggregated from `areal_times`/`areal_rainfall` when
/// only hourly areal rainfall is available.
#[pyfunction]
#[pyo3(signature = (
    reservoir,
    generator,
    start,
    n1,
    precip,
    evap,
    levels,
    storages,
    start_level,
    observed=None,
    external_inflow=None,
    external_outflow=None,
    daily_rainfall=None,
    areal_times=None,
    areal_rainfall=None,
    point_rainfall=None,
    soil_state=None,
    config_json=None,
))]
#[allow(clippy::too_many_arguments)]
fn run<'py>(
    py: Python<'py>,
    reservoir: &str,
    generator: &str,
    start: &str,
    n1: usize,
    precip: PyReadonlyArray1<'py, f64>,
    evap: PyReadonlyArray1<'py, f64>,
    levels: PyReadonlyArray1<'py, f64>,
    storages: PyReadonlyArray1<'py, f64>,
    start_level: f64,
    observed: Option<PyReadonlyArray1<'py, f64>>,
    external_inflow: Option<PyReadonlyArray1<'py, f64>>,
    external_outflow: Option<PyReadonlyArray1<'py, f64>>,
    daily_rainfall: Option<PyReadonlyArray1<'py, f64>>,
    areal_times: Option<Vec<String>>,
    areal_rainfall: Option<PyReadonlyArray1<'py, f64>>,
    point_rainfall: Option<BTreeMap<String, Vec<f64>>>,
    soil_state: Option<PyReadonlyArray1<'py, f64>>,
    config_json: Option<&str>,
) -> PyResult<Bound<'py, PyDict>> {
    let reservoir: ReservoirKind = reservoir.parse().map_err(value_error)?;
    let generator: GeneratorKind = generator.parse().map_err(value_error)?;
    let config = load_config(config_json)?;
    let profile = config.profile(reservoir).map_err(value_error)?;

    let precip = contiguous_slice(&precip)?;
    let n = precip.len();
    let evap = checked_slice(&evap, n, "evap")?;
    let n2 = n.saturating_sub(n1 + 1);

    let observed = forcing::observed_from_sentinel(optional_slice(&observed)?);
    let forcing = Forcing::assemble(
        n1,
        n2,
        precip,
        evap,
        &observed,
        optional_slice(&external_inflow)?,
        optional_slice(&external_outflow)?,
    )
    .map_err(value_error)?;

    let curve = LevelStorageCurve::new(contiguous_slice(&levels)?.to_vec(), contiguous_slice(&storages)?.to_vec())
        .map_err(value_error)?;

    let soil = match &soil_state {
        Some(arr) => Some(SoilState::from_slice(checked_slice(arr, STATE_SIZE, "soil_state")?).map_err(value_error)?),
        None => None,
    };

    let daily_rainfall = match (&daily_rainfall, &areal_times) {
        (Some(daily), _) => contiguous_slice(daily)?.to_vec(),
        (None, Some(times)) => {
            let hourly = hourly_series(times, optional_slice(&areal_rainfall)?)?;
            profile.antecedent.generator.daily_totals(&hourly)
        }
        (None, None) => Vec::new(),
    };

    let input = ForecastInput {
        start: parse_time(start)?,
        n1,
        forcing,
        curve,
        start_level,
        daily_rainfall,
        point_rainfall: point_rainfall.unwrap_or_default(),
        initial: InitialConditions {
            soil,
            ..InitialConditions::default()
        },
    };

    let forecast = pipeline::run(profile, reservoir, generator, &input).map_err(value_error)?;
    forecast_to_dict(py, &forecast)
}

/// Run the soil-moisture generator alone and return its fluxes.
#[pyfunction]
#[pyo3(signature = (params, precip, evap, initial_state=None))]
fn soil_moisture_run<'py>(
    py: Python<'py>,
    params: PyReadonlyArray1<'py, f64>,
    precip: PyReadonlyArray1<'py, f64>,
    evap: PyReadonlyArray1<'py, f64>,
    initial_state: Option<PyReadonlyArray1<'py, f64>>,
) -> PyResult<Bound<'py, PyDict>> {
    let params = SoilParameters::from_array(contiguous_slice(&params)?).map_err(value_error)?;
    let precip = contiguous_slice(&precip)?;
    let evap = checked_slice(&evap, precip.len(), "evap")?;
    let state = match &initial_state {
        Some(arr) => Some(SoilState::from_slice(checked_slice(arr, STATE_SIZE, "initial_state")?).map_err(value_error)?),
        None => None,
    };

    let observed = vec![None; precip.len()];
    let zeros = vec![0.0; precip.len()];
    let forcing = Forcing::new(precip.to_vec(), evap.to_vec(), observed, zeros.clone(), zeros).map_err(value_error)?;

    let model = SoilMoistureGenerator::new(params);
    let result = model.run(&forcing, state.map(|s| s.clamped(&params)).as_ref());
    let fluxes = result.fluxes;
    Ok(series_to_dict!(
        py, fluxes, precip, evap, pet, evap_upper, evap_lower, evap_deep, excess, runoff, runoff_fraction, upper,
        lower, deep,
    ))
}

/// Advance the soil-moisture store by a single step.
#[pyfunction]
fn soil_moisture_step<'py>(
    py: Python<'py>,
    state: PyReadonlyArray1<'py, f64>,
    params: PyReadonlyArray1<'py, f64>,
    precip: f64,
    evap: f64,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyDict>)> {
    let params = SoilParameters::from_array(contiguous_slice(&params)?).map_err(value_error)?;
    let state = SoilState::from_slice(checked_slice(&state, STATE_SIZE, "state")?).map_err(value_error)?;

    let (new_state, f) = soil_run::step(&state, &params, precip, evap);
    let state_arr = PyArray1::from_vec(py, new_state.to_array().to_vec());
    let dict = fluxes_to_dict!(py, f, precip, evap, pet, excess, runoff, runoff_fraction, upper, lower, deep);
    Ok((state_arr, dict))
}

/// Partition and route a generated runoff series with a reservoir's setup.
#[pyfunction]
#[pyo3(signature = (reservoir, generator, net_rainfall, excess, config_json=None))]
fn route(
    py: Python<'_>,
    reservoir: &str,
    generator: &str,
    net_rainfall: PyReadonlyArray1<'_, f64>,
    excess: PyReadonlyArray1<'_, f64>,
    config_json: Option<&str>,
) -> PyResult<RoutedFlowResult> {
    let reservoir: ReservoirKind = reservoir.parse().map_err(value_error)?;
    let generator: GeneratorKind = generator.parse().map_err(value_error)?;
    let config = load_config(config_json)?;
    let profile = config.profile(reservoir).map_err(value_error)?;
    let (partition_params, routing) = match generator {
        GeneratorKind::SoilMoisture => (&profile.soil_moisture.partition, &profile.soil_moisture.routing),
        GeneratorKind::AntecedentIndex => (&profile.antecedent.partition, &profile.antecedent.routing),
    };

    let net = contiguous_slice(&net_rainfall)?;
    let excess = checked_slice(&excess, net.len(), "excess")?;
    let generation: Vec<_> = net
        .iter()
        .zip(excess)
        .map(|(&net_rainfall, &excess)| hydrocast_core::traits::Generation {
            net_rainfall,
            excess,
            runoff_depth: net_rainfall,
        })
        .collect();

    let components = partition::run(partition_params, &generation, None);
    let routed = confluence::route(routing, &components, None);
    Ok(RoutedFlowResult::from_series(py, routed))
}

/// Daily antecedent totals from hourly areal rainfall.
///
/// Hours after the end of the latest rainfall event are left out; the event
/// gap comes from the reservoir profile.
#[pyfunction]
#[pyo3(signature = (reservoir, times, rainfall, config_json=None))]
fn daily_rainfall<'py>(
    py: Python<'py>,
    reservoir: &str,
    times: Vec<String>,
    rainfall: PyReadonlyArray1<'py, f64>,
    config_json: Option<&str>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let reservoir: ReservoirKind = reservoir.parse().map_err(value_error)?;
    let config = load_config(config_json)?;
    let profile = config.profile(reservoir).map_err(value_error)?;
    let hourly = hourly_series(&times, contiguous_slice(&rainfall)?)?;
    Ok(PyArray1::from_vec(py, profile.antecedent.generator.daily_totals(&hourly)))
}

/// Built-in reservoir configuration as JSON.
#[pyfunction]
fn builtin_config() -> PyResult<String> {
    HydrocastConfig::default().to_json_pretty().map_err(value_error)
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "forecast")?;
    m.add_class::<RoutedFlowResult>()?;
    m.add_function(wrap_pyfunction!(run, &m)?)?;
    m.add_function(wrap_pyfunction!(soil_moisture_run, &m)?)?;
    m.add_function(wrap_pyfunction!(soil_moisture_step, &m)?)?;
    m.add_function(wrap_pyfunction!(route, &m)?)?;
    m.add_function(wrap_pyfunction!(daily_rainfall, &m)?)?;
    m.add_function(wrap_pyfunction!(builtin_config, &m)?)?;
    parent.add_submodule(&m)?;
    Ok(())
}
