//! Forcing series for one forecast run.
//!
//! Rainfall and evaporation cover the history window (`n1 + 1` steps) and the
//! forecast horizon (`n2` steps) at an hourly cadence. Observed inflow is
//! sparse; missing samples are `None` here and `-1` at the storage boundary.
use chrono::{NaiveDateTime, Timelike};

use crate::error::{ForecastError, ForecastResult};

/// Sentinel used by the data-access layer for a missing observed inflow.
pub const MISSING_OBSERVATION: f64 = -1.0;

/// Sentinel used by the data-access layer for an undefined water level.
pub const UNDEFINED_LEVEL: f64 = -999.0;

/// Number of daily totals feeding the antecedent precipitation index.
pub const ANTECEDENT_DAYS: usize = 20;

/// Hour at which a hydrological day starts.
pub const DAY_START_HOUR: u32 = 9;

/// Rainfall and evaporation for a single step [mm].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub precip: f64,
    pub evap: f64,
}

/// Validated per-step inputs. All series share one length.
#[derive(Debug, Clone)]
pub struct Forcing {
    pub precip: Vec<f64>,
    pub evap: Vec<f64>,
    /// Observed reservoir inflow [m3/s].
    pub observed_inflow: Vec<Option<f64>>,
    /// Inflow from outside the modelled basin [m3/s].
    pub external_inflow: Vec<f64>,
    /// Release from the reservoir [m3/s].
    pub external_outflow: Vec<f64>,
}

impl Forcing {
    /// Create a new Forcing with validation.
    ///
    /// Validates:
    /// - every series has the length of `precip`
    /// - no NaN or infinity in rainfall, evaporation or external flows
    /// - the series are non-empty
    pub fn new(
        precip: Vec<f64>,
        evap: Vec<f64>,
        observed_inflow: Vec<Option<f64>>,
        external_inflow: Vec<f64>,
        external_outflow: Vec<f64>,
    ) -> ForecastResult<Self> {
        let n = precip.len();
        if n == 0 {
            return Err(ForecastError::SeriesLength {
                name: "precip",
                expected: 1,
                actual: 0,
            });
        }
        check_len("evap", n, evap.len())?;
        check_len("observed_inflow", n, observed_inflow.len())?;
        check_len("external_inflow", n, external_inflow.len())?;
        check_len("external_outflow", n, external_outflow.len())?;
        check_finite("precip", &precip)?;
        check_finite("evap", &evap)?;
        check_finite("external_inflow", &external_inflow)?;
        check_finite("external_outflow", &external_outflow)?;

        Ok(Self {
            precip,
            evap,
            observed_inflow,
            external_inflow,
            external_outflow,
        })
    }

    /// Build forcing for a run with `n1 + 1` history steps and `n2` horizon steps.
    ///
    /// Short rainfall and evaporation series are zero-padded, observed inflow is
    /// padded with missing samples, and external flows repeat their last value
    /// (zero when nothing was supplied). Longer series are truncated.
    pub fn assemble(
        n1: usize,
        n2: usize,
        precip: &[f64],
        evap: &[f64],
        observed_inflow: &[Option<f64>],
        external_inflow: &[f64],
        external_outflow: &[f64],
    ) -> ForecastResult<Self> {
        let n = n1 + 1 + n2;
        Self::new(
            pad_with(precip, n, 0.0),
            pad_with(evap, n, 0.0),
            pad_with(observed_inflow, n, None),
            pad_repeat_last(external_inflow, n),
            pad_repeat_last(external_outflow, n),
        )
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.precip.len()
    }

    /// Returns `true` if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.precip.is_empty()
    }

    /// Rainfall and evaporation at step `t`.
    pub fn sample(&self, t: usize) -> Sample {
        Sample {
            precip: self.precip[t],
            evap: self.evap[t],
        }
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> ForecastResult<()> {
    if expected != actual {
        return Err(ForecastError::SeriesLength {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_finite(name: &'static str, values: &[f64]) -> ForecastResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::NonFinite(name));
    }
    Ok(())
}

/// Total rainfall over the first `n` steps (clipped to the series).
pub fn leading_rainfall(precip: &[f64], n: usize) -> f64 {
    precip.iter().take(n).sum()
}

fn pad_with<T: Copy>(values: &[T], n: usize, fill: T) -> Vec<T> {
    let mut out: Vec<T> = values.iter().copied().take(n).collect();
    out.resize(n, fill);
    out
}

fn pad_repeat_last(values: &[f64], n: usize) -> Vec<f64> {
    let last = values.last().copied().unwrap_or(0.0);
    pad_with(values, n, last)
}

/// Convert a sentinel-encoded observed inflow series (`-1` = missing).
pub fn observed_from_sentinel(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&v| {
            if v == MISSING_OBSERVATION || v.is_nan() {
                None
            } else {
                Some(v)
            }
        })
        .collect()
}

/// Encode an optional level into the sentinel form (`-999` = undefined).
pub fn level_to_sentinel(level: Option<f64>) -> f64 {
    level.unwrap_or(UNDEFINED_LEVEL)
}

/// Index of the last hour of the latest rainfall event.
///
/// That is the latest step preceded by `gap_hours` dry hours. Without such a
/// step the whole series belongs to the event history and the last index is
/// returned.
pub fn storm_end(hourly: &[f64], gap_hours: usize) -> usize {
    let last = hourly.len().saturating_sub(1);
    (gap_hours + 1..hourly.len())
        .rev()
        .find(|&i| hourly[i - gap_hours..i].iter().sum::<f64>() == 0.0)
        .unwrap_or(last)
}

/// Aggregate hourly areal rainfall into hydrological days.
///
/// A day closes at every `day_start_hour` boundary; the trailing partial day is
/// not emitted. The most recent [`ANTECEDENT_DAYS`] totals are returned,
/// front-padded with zeros when fewer days are available.
pub fn daily_rainfall_totals(hourly: &[(NaiveDateTime, f64)], day_start_hour: u32) -> Vec<f64> {
    let mut days = Vec::new();
    let mut accumulated = 0.0;
    for &(time, value) in hourly {
        if time.hour() == day_start_hour {
            days.push(accumulated);
            accumulated = 0.0;
        }
        accumulated += value;
    }

    let keep = days.len().saturating_sub(ANTECEDENT_DAYS);
    let mut totals = vec![0.0; ANTECEDENT_DAYS.saturating_sub(days.len())];
    totals.extend_from_slice(&days[keep..]);
    totals
}

/// Daily totals feeding the antecedent index.
///
/// Hours after the end of the latest event (see [`storm_end`]) are dropped,
/// so rain of an ongoing storm does not count as antecedent rainfall.
pub fn antecedent_daily_totals(hourly: &[(NaiveDateTime, f64)], gap_hours: usize) -> Vec<f64> {
    let values: Vec<f64> = hourly.iter().map(|&(_, v)| v).collect();
    let end = (storm_end(&values, gap_hours) + 1).min(hourly.len());
    daily_rainfall_totals(&hourly[..end], DAY_START_HOUR)
}
