//! Soil-moisture accounting process functions.
//!
//! Pure functions for the three-layer evapotranspiration split, the
//! saturation-excess runoff of the storage-capacity curve and the layer
//! mass balance.

use super::params::Parameters;
use super::state::State;

/// Evapotranspiration drawn from each layer for one step [mm].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerEvaporation {
    pub upper: f64,
    pub lower: f64,
    pub deep: f64,
}

impl LayerEvaporation {
    pub fn total(&self) -> f64 {
        self.upper + self.lower + self.deep
    }
}

/// Split potential evapotranspiration `pet` across the three layers.
///
/// The upper layer supplies everything while `WU + P >= EP`. Otherwise the
/// upper layer is exhausted and the remainder cascades:
/// - `WL >= C * WLM`: lower layer at rate `WL / WLM`
/// - `WL >= C * (EP - EU)`: lower layer supplies `C * (EP - EU)`
/// - else the lower layer is emptied and the deep layer supplies the rest of
///   `C * (EP - EU)`.
pub fn evapotranspiration(precip: f64, pet: f64, state: &State, params: &Parameters) -> LayerEvaporation {
    if state.upper + precip >= pet {
        return LayerEvaporation {
            upper: pet,
            lower: 0.0,
            deep: 0.0,
        };
    }

    let eu = state.upper + precip;
    let deficit = pet - eu;

    if state.lower >= params.c * params.wlm {
        LayerEvaporation {
            upper: eu,
            lower: deficit * state.lower / params.wlm,
            deep: 0.0,
        }
    } else if state.lower >= params.c * deficit {
        LayerEvaporation {
            upper: eu,
            lower: params.c * deficit,
            deep: 0.0,
        }
    } else {
        LayerEvaporation {
            upper: eu,
            lower: state.lower,
            deep: params.c * deficit - state.lower,
        }
    }
}

/// Rainfall excess PE = max(P - EU - EL - ED, 0) [mm].
pub fn rainfall_excess(precip: f64, evap: &LayerEvaporation) -> f64 {
    (precip - evap.total()).max(0.0)
}

/// Saturation-excess runoff from the storage-capacity curve.
///
/// Point capacities follow `1 - (1 - W'/WMM)^B` with WMM = WM * (1 + B). With
/// A the ordinate of the current areal storage `w0`:
/// - `PE + A < WMM`: R = PE - WM * [(1 - A/WMM)^(1+B) - (1 - (PE+A)/WMM)^(1+B)]
/// - otherwise the whole basin is saturated: R = PE - (WM - W0)
///
/// The result is bounded to [0, PE].
pub fn saturation_excess(excess: f64, w0: f64, wm: f64, b: f64) -> f64 {
    if excess <= 0.0 {
        return 0.0;
    }
    let wmm = wm * (1.0 + b);
    let fill = (w0 / wm).clamp(0.0, 1.0);
    let a = wmm * (1.0 - (1.0 - fill).powf(1.0 / (1.0 + b)));

    let runoff = if excess + a < wmm {
        excess
            - wm * ((1.0 - a / wmm).powf(1.0 + b) - (1.0 - (excess + a) / wmm).powf(1.0 + b))
    } else {
        excess - (wm - w0)
    };

    runoff.clamp(0.0, excess)
}

/// Runoff-producing area fraction FR = R / PE (zero when PE is zero).
pub fn runoff_fraction(runoff: f64, excess: f64) -> f64 {
    if excess > 0.0 {
        runoff / excess
    } else {
        0.0
    }
}

/// Update the layer contents by mass balance.
///
/// Rainfall minus upper-layer evaporation and runoff enters the upper layer;
/// surplus above a layer's capacity spills into the next one down, and the
/// deep layer discards anything above its own capacity. Every layer is
/// clamped into its capacity range.
pub fn update_soil(
    state: &State,
    precip: f64,
    evap: &LayerEvaporation,
    runoff: f64,
    params: &Parameters,
) -> State {
    let mut upper = state.upper + precip - evap.upper - runoff;
    let mut lower = state.lower - evap.lower;
    let mut deep = state.deep - evap.deep;

    if upper > params.wum {
        lower += upper - params.wum;
        upper = params.wum;
    }
    if lower > params.wlm {
        deep += lower - params.wlm;
        lower = params.wlm;
    }

    State { upper, lower, deep }.clamped(params)
}
