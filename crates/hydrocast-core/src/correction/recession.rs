//! Rule-based post-correction of the forecast hydrograph.
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::forcing::leading_rainfall;

/// Scale factor applied to the next discharge when the current discharge is
/// below `below` and the next step is dry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecessionBand {
    pub below: f64,
    pub factor: f64,
}

/// Drought bias removal followed by a dry-weather recession pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCorrection {
    /// History rainfall below which the drought offset applies [mm].
    pub drought_rainfall: f64,
    /// Subtracted from every discharge in a drought [m3/s].
    pub drought_offset: f64,
    /// Next-step rainfall below which the step counts as dry [mm].
    pub dry_step_rainfall: f64,
    /// Ascending bands; discharge above the last band is left alone.
    pub bands: Vec<RecessionBand>,
}

impl Default for PostCorrection {
    fn default() -> Self {
        Self {
            drought_rainfall: 5.0,
            drought_offset: 15.0,
            dry_step_rainfall: 1e-4,
            bands: vec![
                RecessionBand { below: 0.6, factor: 0.0 },
                RecessionBand { below: 2.0, factor: 0.8 },
                RecessionBand { below: 6.0, factor: 0.85 },
                RecessionBand { below: 17.0, factor: 0.92 },
                RecessionBand { below: 30.0, factor: 0.97 },
            ],
        }
    }
}

impl PostCorrection {
    /// Bands must be non-empty with ascending limits and factors in [0, 1].
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bands.is_empty() {
            return Err(ConfigError::Empty("post-correction bands"));
        }
        for (index, pair) in self.bands.windows(2).enumerate() {
            if pair[1].below <= pair[0].below {
                return Err(ConfigError::UnorderedBands { index: index + 1 });
            }
        }
        if let Some(band) = self.bands.iter().find(|b| !(0.0..=1.0).contains(&b.factor)) {
            return Err(ConfigError::OutOfBounds {
                name: "recession factor",
                value: band.factor,
                min: 0.0,
                max: 1.0,
            });
        }
        for (name, value) in [
            ("drought_offset", self.drought_offset),
            ("drought_rainfall", self.drought_rainfall),
            ("dry_step_rainfall", self.dry_step_rainfall),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::OutOfBounds {
                    name,
                    value,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
        }
        Ok(())
    }

    /// Recession factor for the current discharge, `None` when unbounded.
    pub fn factor(&self, discharge: f64) -> Option<f64> {
        self.bands
            .iter()
            .find(|band| discharge < band.below)
            .map(|band| band.factor)
    }

    /// Subtract the drought offset, floored at zero.
    pub fn remove_drought_bias(&self, discharge: &mut [f64]) {
        for q in discharge.iter_mut() {
            *q = (*q - self.drought_offset).max(0.0);
        }
    }

    /// Sequential in-place recession: a dry next step takes the banded
    /// fraction of the current discharge.
    pub fn apply_recession(&self, discharge: &mut [f64], precip: &[f64]) {
        for i in 0..discharge.len().saturating_sub(1) {
            let next_rain = precip.get(i + 1).copied().unwrap_or(0.0);
            if next_rain >= self.dry_step_rainfall {
                continue;
            }
            if let Some(factor) = self.factor(discharge[i]) {
                discharge[i + 1] = discharge[i] * factor;
            }
        }
    }

    /// Full post-correction. `n1` is the forecast origin; the drought check
    /// covers rainfall up to and including it.
    pub fn apply(&self, discharge: &mut [f64], precip: &[f64], n1: usize) {
        if leading_rainfall(precip, n1 + 1) < self.drought_rainfall {
            self.remove_drought_bias(discharge);
        }
        self.apply_recession(discharge, precip);
    }
}
