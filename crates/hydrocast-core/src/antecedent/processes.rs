/// Antecedent-index generator process functions.
///
/// Pure functions: antecedent index, rainstorm centre, cumulative runoff.
use std::collections::BTreeMap;

use smallvec::SmallVec;

use super::constants::{PA_CAP, STORM_WINDOW};
use super::params::{Parameters, PowerLaw, StationSets};
use crate::forcing::ANTECEDENT_DAYS;

/// Where the rainstorm is centred relative to the reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StormCentre {
    Upstream,
    Downstream,
}

impl StormCentre {
    /// Power law applying to this centre.
    pub fn law(self, params: &Parameters) -> &PowerLaw {
        match self {
            StormCentre::Upstream => &params.upstream,
            StormCentre::Downstream => &params.downstream,
        }
    }

    pub fn as_flag(self) -> f64 {
        match self {
            StormCentre::Upstream => 1.0,
            StormCentre::Downstream => 0.0,
        }
    }
}

/// Antecedent precipitation index from daily rainfall totals.
///
/// Only the most recent [`ANTECEDENT_DAYS`] totals are used. The day `d` days
/// back from the newest total is weighted `K^(d+1)`; the newest total itself
/// does not contribute. Non-finite results become 0 and the index is capped
/// at [`PA_CAP`].
pub fn antecedent_index(daily_totals: &[f64], k: f64) -> f64 {
    let keep = daily_totals.len().saturating_sub(ANTECEDENT_DAYS);
    let days = &daily_totals[keep..];
    let len = days.len();

    let mut pa = 0.0;
    for day in 1..len {
        pa += k.powi(day as i32 + 1) * days[len - day - 1];
    }

    if !pa.is_finite() {
        return 0.0;
    }
    pa.min(PA_CAP)
}

/// Point rainfall summed over the [`STORM_WINDOW`] steps ending at `t`.
///
/// The window is clipped to the start and end of the series.
pub fn window_rainfall(series: &[f64], t: usize) -> f64 {
    let start = (t + 1).saturating_sub(STORM_WINDOW);
    let end = (t + 1).min(series.len());
    if start >= end {
        return 0.0;
    }
    series[start..end].iter().sum()
}

/// Locate the rainstorm centre at step `t`.
///
/// The centre is the station with the largest trailing-window rainfall. Ties
/// go to the first station in upstream-then-downstream order. Stations
/// without a series count as dry.
pub fn storm_centre(
    stations: &StationSets,
    point_rainfall: &BTreeMap<String, Vec<f64>>,
    t: usize,
) -> StormCentre {
    let sums: SmallVec<[(StormCentre, f64); 16]> = stations
        .upstream
        .iter()
        .map(|s| (StormCentre::Upstream, s))
        .chain(stations.downstream.iter().map(|s| (StormCentre::Downstream, s)))
        .map(|(centre, station)| {
            let total = point_rainfall
                .get(station)
                .map_or(0.0, |series| window_rainfall(series, t));
            (centre, total)
        })
        .collect();

    let mut best = (StormCentre::Upstream, f64::NEG_INFINITY);
    for &(centre, total) in &sums {
        if total > best.1 {
            best = (centre, total);
        }
    }
    best.0
}

/// Cumulative net runoff from cumulative event rainfall plus Pa [mm].
pub fn cumulative_runoff(law: &PowerLaw, cumulative_precip: f64, pa: f64) -> f64 {
    law.apply((cumulative_precip + pa).max(0.0))
}

/// Rainfall excess over potential evapotranspiration [mm].
pub fn rainfall_excess(precip: f64, pet: f64) -> f64 {
    (precip - pet).max(0.0)
}
