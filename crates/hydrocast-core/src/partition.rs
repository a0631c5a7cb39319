//! Three-source partition of generated runoff.
//!
//! Splits the net rainfall of each step into surface runoff, interflow and
//! groundwater runoff through a free-water storage curve. The runoff-producing
//! area fraction `FR = R / PE` scales the free-water reservoir; its storage
//! `S0` and the previous fraction `FR0` are carried between steps.
//!
//! The capacity-curve inversion raises a possibly negative base to a
//! fractional power. That intermediate is evaluated in the complex plane and
//! only its real part is kept. This is a known approximation of the
//! calibrated model and is reproduced as is.

use hydrocast_macros::StepSeries;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::impl_step_series_ops;
use crate::traits::Generation;

/// Free-water storage parameters.
///
/// - `sm`: areal mean free-water capacity [mm]
/// - `ex`: exponent of the free-water capacity curve [-]
/// - `ki`: interflow outflow coefficient [-]
/// - `kg`: groundwater outflow coefficient [-]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub sm: f64,
    pub ex: f64,
    pub ki: f64,
    pub kg: f64,
}

impl Parameters {
    pub fn new(sm: f64, ex: f64, ki: f64, kg: f64) -> ConfigResult<Self> {
        let p = Self { sm, ex, ki, kg };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check("sm", self.sm, 1e-6, 500.0)?;
        check("ex", self.ex, 0.0, 10.0)?;
        check("ki", self.ki, 0.0, 1.0)?;
        check("kg", self.kg, 0.0, 1.0)?;
        check("ki + kg", self.ki + self.kg, 0.0, 1.0)?;
        Ok(())
    }

    /// Maximum point free-water capacity `SM * (EX + 1)`.
    pub fn max_capacity(&self) -> f64 {
        self.sm * (self.ex + 1.0)
    }
}

fn check(name: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfBounds {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Free-water state carried between steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Free-water depth S0 [mm].
    pub free_water: f64,
    /// Runoff-producing area fraction of the previous step FR0 [-].
    pub area_fraction: f64,
}

/// Single-step partition fluxes.
#[derive(Debug, Clone, Copy, StepSeries)]
pub struct Fluxes {
    pub area_fraction: f64,
    pub capacity_ordinate: f64,
    pub surface: f64,
    pub interflow: f64,
    pub groundwater: f64,
    pub free_water: f64,
}

impl_step_series_ops!(FluxesSeries, Fluxes);

/// Real part of `base^exponent` evaluated on the principal complex branch.
pub fn real_power(base: f64, exponent: f64) -> f64 {
    if base >= 0.0 {
        return base.powf(exponent);
    }
    Complex64::new(base, 0.0).powf(exponent).re
}

/// Runoff-producing area fraction `R / PE`, clamped to [0, 1].
pub fn area_fraction(net_rainfall: f64, excess: f64) -> f64 {
    if excess <= 0.0 {
        return 0.0;
    }
    (net_rainfall / excess).clamp(0.0, 1.0)
}

/// Partition one step of generated runoff.
pub fn step(state: &State, params: &Parameters, generation: &Generation) -> (State, Fluxes) {
    let fr = area_fraction(generation.net_rainfall, generation.excess);

    if fr == 0.0 {
        let fluxes = Fluxes {
            area_fraction: 0.0,
            capacity_ordinate: 0.0,
            surface: 0.0,
            interflow: 0.0,
            groundwater: 0.0,
            free_water: 0.0,
        };
        return (State::default(), fluxes);
    }

    let sm = params.sm;
    let ex = params.ex;
    let ms = params.max_capacity();
    let pe = generation.excess;
    let r = generation.net_rainfall;

    // Free water of the previous step spread over the current area.
    let carried = state.free_water * state.area_fraction / fr;

    let au = ms * (1.0 - real_power(1.0 - carried / sm, 1.0 / (1.0 + ex)));

    let surface = if pe + au < ms {
        fr * (pe + carried - sm + sm * (1.0 - (pe + au) / ms).powf(ex + 1.0))
    } else {
        fr * (pe + carried - sm)
    };

    let s = carried + (r - surface) / fr;
    let interflow = params.ki * s * fr;
    let groundwater = params.kg * s * fr;

    let new_state = State {
        free_water: s * (1.0 - params.ki - params.kg),
        area_fraction: fr,
    };
    let fluxes = Fluxes {
        area_fraction: fr,
        capacity_ordinate: au,
        surface,
        interflow,
        groundwater,
        free_water: new_state.free_water,
    };
    (new_state, fluxes)
}

/// Partition a whole generation series.
pub fn run(params: &Parameters, generation: &[Generation], initial_state: Option<&State>) -> FluxesSeries {
    let mut state = initial_state.copied().unwrap_or_default();
    let mut out = FluxesSeries::with_capacity(generation.len());
    for g in generation {
        let (new_state, fluxes) = step(&state, params, g);
        out.push(&fluxes);
        state = new_state;
    }
    out
}
