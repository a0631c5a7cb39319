//! Reservoir level reconstruction through a level–storage curve.
//!
//! Storage is in 10^4 m3 and levels in metres. A flow of `q` m3/s held for
//! one hourly step adds `q * 3600 / 10^4` to storage.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Seconds per step.
pub const STEP_SECONDS: f64 = 3600.0;

/// Cubic metres per storage unit.
pub const STORAGE_UNIT_M3: f64 = 1.0e4;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurveTable {
    levels: Vec<f64>,
    storages: Vec<f64>,
}

/// Piecewise-linear, strictly increasing level–storage relation.
///
/// Queries outside the table are clamped to its first or last row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveTable", into = "CurveTable")]
pub struct LevelStorageCurve {
    levels: Vec<f64>,
    storages: Vec<f64>,
}

impl TryFrom<CurveTable> for LevelStorageCurve {
    type Error = ConfigError;

    fn try_from(table: CurveTable) -> ConfigResult<Self> {
        Self::new(table.levels, table.storages)
    }
}

impl From<LevelStorageCurve> for CurveTable {
    fn from(curve: LevelStorageCurve) -> Self {
        CurveTable {
            levels: curve.levels,
            storages: curve.storages,
        }
    }
}

impl LevelStorageCurve {
    /// Build a curve from matching level and storage columns.
    pub fn new(levels: Vec<f64>, storages: Vec<f64>) -> ConfigResult<Self> {
        if levels.len() != storages.len() {
            return Err(ConfigError::CurveShape {
                levels: levels.len(),
                storages: storages.len(),
            });
        }
        if levels.is_empty() {
            return Err(ConfigError::Empty("level-storage table"));
        }
        if levels.len() < 2 {
            return Err(ConfigError::WrongLength {
                name: "level-storage rows (at least)",
                expected: 2,
                actual: levels.len(),
            });
        }
        for row in 1..levels.len() {
            if !(levels[row] > levels[row - 1] && storages[row] > storages[row - 1]) {
                return Err(ConfigError::NonMonotonicCurve { row });
            }
        }
        Ok(Self { levels, storages })
    }

    /// Build a curve from `(level, storage)` rows.
    pub fn from_pairs(rows: &[(f64, f64)]) -> ConfigResult<Self> {
        let (levels, storages) = rows.iter().copied().unzip();
        Self::new(levels, storages)
    }

    /// Storage at `level` [10^4 m3].
    pub fn storage_at(&self, level: f64) -> f64 {
        interpolate(&self.levels, &self.storages, level)
    }

    /// Level at `storage` [m].
    pub fn level_at(&self, storage: f64) -> f64 {
        interpolate(&self.storages, &self.levels, storage)
    }
}

/// Linear interpolation in an increasing table, clamped at both ends.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    // xs[hi - 1] < x < xs[hi]
    let hi = xs.partition_point(|&v| v < x);
    if xs[hi] == x {
        return ys[hi];
    }
    let lo = hi - 1;
    ys[lo] + (x - xs[lo]) / (xs[hi] - xs[lo]) * (ys[hi] - ys[lo])
}

/// Level trajectory from discharge and external flows.
///
/// Steps before `n1` are undefined, `n1` carries `start_level` unchanged and
/// later steps integrate `discharge + inflow - outflow` from the storage at
/// the start level.
pub fn reconstruct(
    curve: &LevelStorageCurve,
    discharge: &[f64],
    inflow: &[f64],
    outflow: &[f64],
    n1: usize,
    start_level: f64,
) -> Vec<Option<f64>> {
    let n = discharge.len();
    let mut levels = vec![None; n];
    if n1 >= n {
        return levels;
    }

    levels[n1] = Some(start_level);
    let start_storage = curve.storage_at(start_level);
    let mut volume = 0.0;
    for i in n1 + 1..n {
        let external = inflow.get(i).copied().unwrap_or(0.0) - outflow.get(i).copied().unwrap_or(0.0);
        volume += (discharge[i] + external) * STEP_SECONDS / STORAGE_UNIT_M3;
        levels[i] = Some(curve.level_at(start_storage + volume));
    }
    levels
}
