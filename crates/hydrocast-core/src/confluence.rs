//! Confluence: component runoff to reservoir inflow discharge.
//!
//! Surface runoff is convolved with a unit hydrograph. Interflow and
//! groundwater each pass through a first-order linear recession
//! `Q = (1 - C) * R * area / 3.6 + C * Q_prev`.

use hydrocast_macros::StepSeries;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::impl_step_series_ops;
use crate::partition::FluxesSeries as PartitionSeries;

/// Conversion from mm over km2 per hour to m3/s.
pub const MM_KM2_PER_HOUR_TO_M3S: f64 = 3.6;

/// Routing parameters.
///
/// - `area`: catchment area [km2]
/// - `ci`: interflow recession coefficient [-]
/// - `cg`: groundwater recession coefficient [-]
/// - `unit_hydrograph`: surface-runoff impulse response, one ordinate per step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub area: f64,
    pub ci: f64,
    pub cg: f64,
    pub unit_hydrograph: Vec<f64>,
}

impl Parameters {
    pub fn new(area: f64, ci: f64, cg: f64, unit_hydrograph: Vec<f64>) -> ConfigResult<Self> {
        let p = Self {
            area,
            ci,
            cg,
            unit_hydrograph,
        };
        p.validate()?;
        Ok(p)
    }

    /// Rejects an empty unit hydrograph, a non-positive area and recession
    /// coefficients outside [0, 1).
    pub fn validate(&self) -> ConfigResult<()> {
        if self.unit_hydrograph.is_empty() {
            return Err(ConfigError::Empty("unit hydrograph"));
        }
        if self.area <= 0.0 {
            return Err(ConfigError::OutOfBounds {
                name: "area",
                value: self.area,
                min: f64::MIN_POSITIVE,
                max: f64::INFINITY,
            });
        }
        for (name, c) in [("ci", self.ci), ("cg", self.cg)] {
            if !(0.0..1.0).contains(&c) {
                return Err(ConfigError::OutOfBounds {
                    name,
                    value: c,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(())
    }
}

/// Interflow and groundwater discharge of the step before the run [m3/s].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub interflow: f64,
    pub groundwater: f64,
}

/// Routed discharge per step [m3/s].
#[derive(Debug, Clone, Copy, StepSeries)]
#[series(name = "RoutedFlowSeries")]
pub struct RoutedFlow {
    pub surface: f64,
    pub interflow: f64,
    pub groundwater: f64,
    pub discharge: f64,
}

impl_step_series_ops!(RoutedFlowSeries, RoutedFlow);

/// Full discrete convolution of `input` with `kernel`, truncated to
/// `input.len()` samples.
pub fn convolve(input: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = input.len();
    let mut out = vec![0.0; n];
    for (i, &x) in input.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (k, &w) in kernel.iter().enumerate().take(n - i) {
            out[i + k] += x * w;
        }
    }
    out
}

/// First-order linear recession over a runoff series.
pub fn recession(runoff: &[f64], coefficient: f64, area: f64, initial: f64) -> Vec<f64> {
    let mut previous = initial;
    runoff
        .iter()
        .map(|&r| {
            let q = (1.0 - coefficient) * r * area / MM_KM2_PER_HOUR_TO_M3S + coefficient * previous;
            previous = q;
            q
        })
        .collect()
}

/// Route partitioned runoff to discharge.
pub fn route(params: &Parameters, partition: &PartitionSeries, initial_state: Option<&State>) -> RoutedFlowSeries {
    let init = initial_state.copied().unwrap_or_default();

    let surface = convolve(&partition.surface, &params.unit_hydrograph);
    let interflow = recession(&partition.interflow, params.ci, params.area, init.interflow);
    let groundwater = recession(&partition.groundwater, params.cg, params.area, init.groundwater);

    let mut out = RoutedFlowSeries::with_capacity(surface.len());
    for ((&qs, &qi), &qg) in surface.iter().zip(&interflow).zip(&groundwater) {
        out.push(&RoutedFlow {
            surface: qs,
            interflow: qi,
            groundwater: qg,
            discharge: qs + qi + qg,
        });
    }
    out
}
