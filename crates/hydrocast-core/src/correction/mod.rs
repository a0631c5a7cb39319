//! Correction stages applied to the routed discharge.
//!
//! - [`realtime`]: blend with observed inflow
//! - [`flood`]: peak offset and smoothing by flood class
//! - [`recession`]: drought bias and dry-weather recession
pub mod flood;
pub mod realtime;
pub mod recession;

use tracing::{debug, warn};

use self::flood::{FloodMagnitude, FloodRules, OffsetVariant, PeakOffsets};

/// Outcome of [`correct_realtime`].
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeCorrection {
    pub discharge: Vec<f64>,
    pub anchors: Vec<usize>,
    pub variant: OffsetVariant,
    /// Peak index that received the flood offset.
    pub adjusted_peak: Option<usize>,
}

/// Real-time correction followed by the flood peak adjustment.
///
/// Without a usable observation window the forecast is only given the
/// uncorrected peak offset.
pub fn correct_realtime(
    discharge: &[f64],
    observed: &[Option<f64>],
    precip: &[f64],
    magnitude: FloodMagnitude,
    rules: &FloodRules,
    offsets: &PeakOffsets,
) -> RealtimeCorrection {
    let blended = realtime::blend(discharge, observed);
    let variant = if blended.is_anchored() {
        OffsetVariant::Corrected
    } else {
        warn!(
            steps = discharge.len(),
            "no usable observation window, applying static flood adjustment"
        );
        OffsetVariant::Uncorrected
    };

    let mut q = blended.discharge;
    let adjusted_peak = if rules.is_active(precip) {
        flood::adjust_peak(&mut q, magnitude, offsets.table(variant), &rules.smoothing)
    } else {
        None
    };
    if let Some(peak) = adjusted_peak {
        debug!(?magnitude, ?variant, peak, "flood peak adjusted");
    }

    RealtimeCorrection {
        discharge: q,
        anchors: blended.anchors,
        variant,
        adjusted_peak,
    }
}
