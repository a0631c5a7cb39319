//! Flood-magnitude classification and peak adjustment.
//!
//! The rainfall of the day before the forecast origin decides whether the
//! event is a minor or major flood. A fixed offset is then added to the
//! forecast peak and the hydrograph around it is smoothed with a 5-point
//! moving average.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::forcing::leading_rainfall;

/// Event class derived from the rainfall before the forecast origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodMagnitude {
    #[default]
    None,
    Minor,
    Major,
}

/// Major-flood thresholds. Either one is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MajorThreshold {
    /// Window rainfall sum [mm].
    pub total: f64,
    /// Single-step rainfall maximum [mm].
    pub peak: f64,
}

/// Smoothing half-width per flood class [steps].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingWidths {
    pub minor: usize,
    pub major: usize,
}

impl SmoothingWidths {
    pub fn for_magnitude(&self, magnitude: FloodMagnitude) -> Option<usize> {
        match magnitude {
            FloodMagnitude::None => None,
            FloodMagnitude::Minor => Some(self.minor),
            FloodMagnitude::Major => Some(self.major),
        }
    }
}

/// Per-reservoir flood classification rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodRules {
    /// Steps before the origin inspected by the classifier.
    pub window: usize,
    /// Leading steps that must carry some rainfall for a peak adjustment.
    pub activation_steps: usize,
    /// Window sum for a minor flood [mm].
    pub minor_total: f64,
    /// Absent for reservoirs without a major class.
    pub major: Option<MajorThreshold>,
    pub smoothing: SmoothingWidths,
}

impl FloodRules {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window == 0 {
            return Err(ConfigError::Empty("flood window"));
        }
        if self.activation_steps == 0 {
            return Err(ConfigError::Empty("flood activation window"));
        }
        Ok(())
    }

    /// Classify the event from the rainfall in `[n1 - window, n1)`.
    pub fn classify(&self, precip: &[f64], n1: usize) -> FloodMagnitude {
        let end = n1.min(precip.len());
        let start = end.saturating_sub(self.window);
        let window = &precip[start..end];
        if window.is_empty() {
            return FloodMagnitude::None;
        }

        let total: f64 = window.iter().sum();
        let peak = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if let Some(major) = &self.major {
            if total >= major.total || peak >= major.peak {
                return FloodMagnitude::Major;
            }
        }
        if total >= self.minor_total {
            return FloodMagnitude::Minor;
        }
        FloodMagnitude::None
    }

    /// Peak adjustments only apply when the leading steps carried rain.
    pub fn is_active(&self, precip: &[f64]) -> bool {
        leading_rainfall(precip, self.activation_steps) != 0.0
    }
}

/// Peak offsets for minor and major floods [m3/s].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MagnitudeOffsets {
    pub minor: f64,
    pub major: f64,
}

impl MagnitudeOffsets {
    pub fn for_magnitude(&self, magnitude: FloodMagnitude) -> f64 {
        match magnitude {
            FloodMagnitude::None => 0.0,
            FloodMagnitude::Minor => self.minor,
            FloodMagnitude::Major => self.major,
        }
    }
}

/// Which offset table to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetVariant {
    /// No observation window was usable.
    Uncorrected,
    /// The forecast was blended with observations.
    Corrected,
}

/// Offset tables for forecasts with and without real-time correction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakOffsets {
    pub uncorrected: MagnitudeOffsets,
    pub corrected: MagnitudeOffsets,
}

impl PeakOffsets {
    pub fn table(&self, variant: OffsetVariant) -> &MagnitudeOffsets {
        match variant {
            OffsetVariant::Uncorrected => &self.uncorrected,
            OffsetVariant::Corrected => &self.corrected,
        }
    }
}

/// Index of the first maximum, `None` for an empty series.
pub fn peak_index(discharge: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &q) in discharge.iter().enumerate() {
        match best {
            Some((_, max)) if q <= max => {}
            _ => best = Some((i, q)),
        }
    }
    best.map(|(i, _)| i)
}

/// 5-point moving average around `peak`, leaving the peak itself untouched.
///
/// Indices in `[max(0, peak - h) + 2, min(n, peak + h) - 2)` are replaced by
/// the mean of the unsmoothed values at `i - 2 ..= i + 2`.
pub fn smooth_peak(discharge: &mut [f64], peak: usize, half_width: usize) {
    let n = discharge.len();
    let start = peak.saturating_sub(half_width) + 2;
    let end = (peak + half_width).min(n).saturating_sub(2);
    if start >= end {
        return;
    }

    let old = discharge.to_vec();
    for i in start..end {
        if i == peak {
            continue;
        }
        discharge[i] = old[i - 2..=i + 2].iter().sum::<f64>() / 5.0;
    }
}

/// Add the class offset to the peak and smooth around it.
///
/// Returns the adjusted peak index, or `None` when nothing was changed.
pub fn adjust_peak(
    discharge: &mut [f64],
    magnitude: FloodMagnitude,
    offsets: &MagnitudeOffsets,
    smoothing: &SmoothingWidths,
) -> Option<usize> {
    let half_width = smoothing.for_magnitude(magnitude)?;
    let peak = peak_index(discharge)?;
    discharge[peak] += offsets.for_magnitude(magnitude);
    smooth_peak(discharge, peak, half_width);
    Some(peak)
}
