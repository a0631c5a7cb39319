//! Forecast output records.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::forcing::UNDEFINED_LEVEL;

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub time: NaiveDateTime,
    /// Inflow discharge [m3/s].
    pub discharge: f64,
    /// Level ignoring external inflow and outflow [m]. `None` before the origin.
    pub level_rainfall_only: Option<f64>,
    /// Level including external inflow and outflow [m]. `None` before the origin.
    pub level_full: Option<f64>,
}

/// A record in the form persisted by the data-access layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub time: NaiveDateTime,
    pub discharge: f64,
    pub level_rainfall_only: f64,
    pub level_full: f64,
}

impl ForecastRecord {
    /// Discharge rounded to 4 decimals and floored at 0, levels rounded to 3
    /// decimals, undefined levels as `-999`.
    pub fn storage_view(&self) -> StoredRecord {
        StoredRecord {
            time: self.time,
            discharge: round_to(self.discharge.max(0.0), 4),
            level_rainfall_only: stored_level(self.level_rainfall_only),
            level_full: stored_level(self.level_full),
        }
    }
}

fn stored_level(level: Option<f64>) -> f64 {
    level.map_or(UNDEFINED_LEVEL, |z| round_to(z, 3))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
