//! Per-reservoir coefficient sets.
//!
//! Two reservoirs are supported. Each profile carries the parameters of both
//! runoff generators and of every shared stage, so the orchestrator only needs
//! a [`ReservoirKind`] and a generator choice to run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::antecedent::constants::{
    DAFANGYING_DOWNSTREAM, DAFANGYING_EVENT_GAP_HOURS, DAFANGYING_UPSTREAM, DONGPU_DOWNSTREAM,
    DONGPU_EVENT_GAP_HOURS, DONGPU_UPSTREAM, STATION_CUTOFF_YEAR,
};
use crate::antecedent::params::{Parameters as AntecedentParameters, StationNetwork, StationSets};
use crate::confluence::Parameters as RoutingParameters;
use crate::correction::flood::{
    FloodRules, MagnitudeOffsets, MajorThreshold, PeakOffsets, SmoothingWidths,
};
use crate::correction::recession::PostCorrection;
use crate::error::{ConfigResult, ForecastError};
use crate::partition::Parameters as PartitionParameters;
use crate::soil_moisture::params::Parameters as SoilMoistureParameters;

/// Reservoir selector. Coded `"0"` / `"1"` by the data-access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservoirKind {
    Dongpu,
    Dafangying,
}

impl ReservoirKind {
    pub const ALL: [ReservoirKind; 2] = [ReservoirKind::Dongpu, ReservoirKind::Dafangying];

    /// Numeric code used at the storage boundary.
    pub fn code(self) -> &'static str {
        match self {
            ReservoirKind::Dongpu => "0",
            ReservoirKind::Dafangying => "1",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReservoirKind::Dongpu => "dongpu",
            ReservoirKind::Dafangying => "dafangying",
        }
    }
}

impl fmt::Display for ReservoirKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReservoirKind {
    type Err = ForecastError;

    /// Accepts the numeric code or the lowercase name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "dongpu" => Ok(ReservoirKind::Dongpu),
            "1" | "dafangying" => Ok(ReservoirKind::Dafangying),
            _ => Err(ForecastError::UnknownReservoir(s.to_string())),
        }
    }
}

/// Everything one generator needs besides the shared correction rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSetup<G> {
    pub generator: G,
    pub partition: PartitionParameters,
    pub routing: RoutingParameters,
    pub peak_offsets: PeakOffsets,
}

impl<G> ModelSetup<G> {
    fn validate_stages(&self) -> ConfigResult<()> {
        self.partition.validate()?;
        self.routing.validate()
    }
}

/// Complete coefficient set for one reservoir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservoirProfile {
    pub soil_moisture: ModelSetup<SoilMoistureParameters>,
    pub antecedent: ModelSetup<AntecedentParameters>,
    pub flood: FloodRules,
    #[serde(default)]
    pub post_correction: PostCorrection,
}

impl ReservoirProfile {
    pub fn validate(&self) -> ConfigResult<()> {
        self.soil_moisture.generator.validate()?;
        self.soil_moisture.validate_stages()?;
        self.antecedent.generator.validate()?;
        self.antecedent.validate_stages()?;
        self.flood.validate()?;
        self.post_correction.validate()
    }

    /// Built-in profile for the given reservoir.
    pub fn builtin(kind: ReservoirKind) -> Self {
        match kind {
            ReservoirKind::Dongpu => Self::dongpu(),
            ReservoirKind::Dafangying => Self::dafangying(),
        }
    }

    /// Dongpu reservoir. Power laws, flood thresholds and uncorrected peak
    /// offsets are the operational values; the remaining coefficients are a
    /// representative calibration.
    pub fn dongpu() -> Self {
        let partition = PartitionParameters {
            sm: 25.0,
            ex: 1.5,
            ki: 0.35,
            kg: 0.3,
        };
        let routing = RoutingParameters {
            area: 207.5,
            ci: 0.8,
            cg: 0.98,
            unit_hydrograph: vec![0.05, 0.15, 0.25, 0.2, 0.14, 0.09, 0.06, 0.04, 0.02],
        };
        let peak_offsets = PeakOffsets {
            uncorrected: MagnitudeOffsets {
                minor: 88.0,
                major: 220.0,
            },
            corrected: MagnitudeOffsets {
                minor: 44.0,
                major: 110.0,
            },
        };

        Self {
            soil_moisture: ModelSetup {
                generator: SoilMoistureParameters {
                    kc: 0.9,
                    wum: 20.0,
                    wlm: 70.0,
                    wm: 140.0,
                    b: 0.3,
                    c: 0.16,
                },
                partition,
                routing: routing.clone(),
                peak_offsets,
            },
            antecedent: ModelSetup {
                generator: AntecedentParameters {
                    kc: 0.9,
                    decay_by_month: MONTHLY_DECAY,
                    upstream: DONGPU_UPSTREAM,
                    downstream: DONGPU_DOWNSTREAM,
                    stations: network(
                        &["DP-U1", "DP-U2", "DP-U3"],
                        &["DP-D1", "DP-D2"],
                        &["DP-U1", "DP-U2", "DP-U3", "DP-U4"],
                        &["DP-D1", "DP-D2", "DP-D3"],
                    ),
                    event_gap_hours: DONGPU_EVENT_GAP_HOURS,
                },
                partition,
                routing,
                peak_offsets,
            },
            flood: FloodRules {
                window: 24,
                activation_steps: 47,
                minor_total: 26.0,
                major: Some(MajorThreshold {
                    total: 100.0,
                    peak: 45.0,
                }),
                smoothing: SmoothingWidths { minor: 4, major: 5 },
            },
            post_correction: PostCorrection::default(),
        }
    }

    /// Dafangying reservoir. Only a minor flood class exists here.
    pub fn dafangying() -> Self {
        let partition = PartitionParameters {
            sm: 20.0,
            ex: 1.5,
            ki: 0.3,
            kg: 0.35,
        };
        let routing = RoutingParameters {
            area: 184.0,
            ci: 0.75,
            cg: 0.98,
            unit_hydrograph: vec![0.08, 0.2, 0.27, 0.2, 0.12, 0.07, 0.04, 0.02],
        };
        let offsets = MagnitudeOffsets {
            minor: 60.0,
            major: 60.0,
        };
        let peak_offsets = PeakOffsets {
            uncorrected: offsets,
            corrected: MagnitudeOffsets {
                minor: 30.0,
                major: 30.0,
            },
        };

        Self {
            soil_moisture: ModelSetup {
                generator: SoilMoistureParameters {
                    kc: 0.9,
                    wum: 15.0,
                    wlm: 65.0,
                    wm: 120.0,
                    b: 0.3,
                    c: 0.15,
                },
                partition,
                routing: routing.clone(),
                peak_offsets,
            },
            antecedent: ModelSetup {
                generator: AntecedentParameters {
                    kc: 0.9,
                    decay_by_month: MONTHLY_DECAY,
                    upstream: DAFANGYING_UPSTREAM,
                    downstream: DAFANGYING_DOWNSTREAM,
                    stations: network(
                        &["DFY-U1", "DFY-U2"],
                        &["DFY-D1", "DFY-D2"],
                        &["DFY-U1", "DFY-U2", "DFY-U3"],
                        &["DFY-D1", "DFY-D2"],
                    ),
                    event_gap_hours: DAFANGYING_EVENT_GAP_HOURS,
                },
                partition,
                routing,
                peak_offsets,
            },
            flood: FloodRules {
                window: 24,
                activation_steps: 47,
                minor_total: 20.0,
                major: None,
                smoothing: SmoothingWidths { minor: 3, major: 3 },
            },
            post_correction: PostCorrection::default(),
        }
    }
}

/// Antecedent decay factor per calendar month, January first.
const MONTHLY_DECAY: [f64; 12] = [
    0.95, 0.94, 0.92, 0.9, 0.88, 0.85, 0.85, 0.85, 0.87, 0.9, 0.93, 0.95,
];

fn network(
    legacy_up: &[&str],
    legacy_down: &[&str],
    current_up: &[&str],
    current_down: &[&str],
) -> StationNetwork {
    let sets = |up: &[&str], down: &[&str]| StationSets {
        upstream: up.iter().map(|s| s.to_string()).collect(),
        downstream: down.iter().map(|s| s.to_string()).collect(),
    };
    StationNetwork {
        cutoff_year: STATION_CUTOFF_YEAR,
        legacy: Some(sets(legacy_up, legacy_down)),
        current: sets(current_up, current_down),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn builtin_profiles_are_valid() {
        for kind in ReservoirKind::ALL {
            ReservoirProfile::builtin(kind).validate().unwrap();
        }
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("0".parse::<ReservoirKind>().unwrap(), ReservoirKind::Dongpu);
        assert_eq!("Dafangying".parse::<ReservoirKind>().unwrap(), ReservoirKind::Dafangying);
        assert!("2".parse::<ReservoirKind>().is_err());
    }

    #[test]
    fn code_round_trips() {
        for kind in ReservoirKind::ALL {
            assert_eq!(kind.code().parse::<ReservoirKind>().unwrap(), kind);
        }
    }

    #[test]
    fn dafangying_has_no_major_class() {
        assert!(ReservoirProfile::dafangying().flood.major.is_none());
        assert!(ReservoirProfile::dongpu().flood.major.is_some());
    }

    #[test]
    fn empty_unit_hydrograph_fails_validation() {
        let mut p = ReservoirProfile::dongpu();
        p.antecedent.routing.unit_hydrograph.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_flood_window_fails_validation() {
        let mut p = ReservoirProfile::dafangying();
        p.flood.window = 0;
        assert!(matches!(p.validate(), Err(ConfigError::Empty("flood window"))));
    }

    #[test]
    fn serde_round_trip_preserves_profile() {
        let p = ReservoirProfile::dafangying();
        let json = serde_json::to_string(&p).unwrap();
        let back: ReservoirProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
