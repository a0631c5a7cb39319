/// Antecedent-index generator parameters.
///
/// - `kc`: ratio of potential evapotranspiration to pan evaporation [-]
/// - `decay_by_month`: antecedent decay factor K for January..December [-]
/// - `upstream` / `downstream`: power laws selected by the rainstorm centre
/// - `stations`: gauge membership used to locate the rainstorm centre
/// - `event_gap_hours`: dry hours that end a rainfall event; later hours are
///   left out of the daily antecedent totals
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::constants::STATION_CUTOFF_YEAR;
use crate::error::{ConfigError, ConfigResult};
use crate::forcing;

/// Empirical cumulative-runoff law R = coefficient * x^exponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    pub coefficient: f64,
    pub exponent: f64,
}

impl PowerLaw {
    pub fn apply(&self, x: f64) -> f64 {
        self.coefficient * x.powf(self.exponent)
    }
}

/// Gauges upstream and downstream of the reservoir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSets {
    pub upstream: Vec<String>,
    pub downstream: Vec<String>,
}

impl StationSets {
    fn validate(&self) -> ConfigResult<()> {
        if self.upstream.is_empty() {
            return Err(ConfigError::Empty("upstream station set"));
        }
        if self.downstream.is_empty() {
            return Err(ConfigError::Empty("downstream station set"));
        }
        Ok(())
    }

    /// Every station in both sets, upstream first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.upstream
            .iter()
            .chain(self.downstream.iter())
            .map(String::as_str)
    }
}

/// Station network, versioned by forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationNetwork {
    /// Last year for which `legacy` applies.
    #[serde(default = "default_cutoff_year")]
    pub cutoff_year: i32,
    #[serde(default)]
    pub legacy: Option<StationSets>,
    pub current: StationSets,
}

fn default_cutoff_year() -> i32 {
    STATION_CUTOFF_YEAR
}

impl StationNetwork {
    /// Station sets in force for a forecast starting in `year`.
    pub fn for_year(&self, year: i32) -> &StationSets {
        match &self.legacy {
            Some(legacy) if year <= self.cutoff_year => legacy,
            _ => &self.current,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub kc: f64,
    pub decay_by_month: [f64; 12],
    pub upstream: PowerLaw,
    pub downstream: PowerLaw,
    pub stations: StationNetwork,
    pub event_gap_hours: usize,
}

impl Parameters {
    /// Check ranges and station sets.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.1..=2.0).contains(&self.kc) {
            return Err(ConfigError::OutOfBounds {
                name: "kc",
                value: self.kc,
                min: 0.1,
                max: 2.0,
            });
        }
        if let Some(&k) = self.decay_by_month.iter().find(|k| !(0.0..=1.0).contains(*k)) {
            return Err(ConfigError::OutOfBounds {
                name: "decay_by_month",
                value: k,
                min: 0.0,
                max: 1.0,
            });
        }
        for law in [&self.upstream, &self.downstream] {
            if law.coefficient <= 0.0 {
                return Err(ConfigError::OutOfBounds {
                    name: "power-law coefficient",
                    value: law.coefficient,
                    min: f64::MIN_POSITIVE,
                    max: f64::INFINITY,
                });
            }
        }
        if self.event_gap_hours == 0 {
            return Err(ConfigError::Empty("event_gap_hours"));
        }
        self.stations.current.validate()?;
        if let Some(legacy) = &self.stations.legacy {
            legacy.validate()?;
        }
        Ok(())
    }

    /// Daily antecedent totals from hourly areal rainfall, cut at the end of
    /// the latest event.
    pub fn daily_totals(&self, hourly: &[(NaiveDateTime, f64)]) -> Vec<f64> {
        forcing::antecedent_daily_totals(hourly, self.event_gap_hours)
    }

    /// Decay factor for calendar month `month` (1..=12, clamped).
    pub fn decay_for_month(&self, month: u32) -> f64 {
        let idx = month.clamp(1, 12) as usize - 1;
        self.decay_by_month[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(up: &[&str], down: &[&str]) -> StationSets {
        StationSets {
            upstream: up.iter().map(|s| s.to_string()).collect(),
            downstream: down.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn test_params() -> Parameters {
        Parameters {
            kc: 0.9,
            decay_by_month: [0.85; 12],
            upstream: PowerLaw { coefficient: 0.0006, exponent: 2.15 },
            downstream: PowerLaw { coefficient: 0.0009, exponent: 2.17 },
            stations: StationNetwork {
                cutoff_year: 2018,
                legacy: Some(sets(&["u1"], &["d1"])),
                current: sets(&["u1", "u2"], &["d1"]),
            },
            event_gap_hours: 13,
        }
    }

    #[test]
    fn power_law_apply() {
        let law = PowerLaw { coefficient: 2.0, exponent: 2.0 };
        assert_eq!(law.apply(3.0), 18.0);
    }

    #[test]
    fn station_network_switches_at_cutoff() {
        let p = test_params();
        assert_eq!(p.stations.for_year(2018).upstream.len(), 1);
        assert_eq!(p.stations.for_year(2019).upstream.len(), 2);
    }

    #[test]
    fn network_without_legacy_always_current() {
        let mut p = test_params();
        p.stations.legacy = None;
        assert_eq!(p.stations.for_year(2001).upstream.len(), 2);
    }

    #[test]
    fn decay_month_is_clamped() {
        let mut p = test_params();
        p.decay_by_month[0] = 0.7;
        p.decay_by_month[11] = 0.95;
        assert_eq!(p.decay_for_month(0), 0.7);
        assert_eq!(p.decay_for_month(13), 0.95);
    }

    #[test]
    fn empty_station_set_is_rejected() {
        let mut p = test_params();
        p.stations.current.downstream.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn decay_above_one_is_rejected() {
        let mut p = test_params();
        p.decay_by_month[5] = 1.2;
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_event_gap_is_rejected() {
        let mut p = test_params();
        p.event_gap_hours = 0;
        assert!(matches!(p.validate(), Err(ConfigError::Empty("event_gap_hours"))));
    }

    #[test]
    fn daily_totals_stop_at_event_gap() {
        let t0 = chrono::NaiveDate::from_ymd_opt(2023, 7, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        // Rain until 07:00, 12 dry hours, then a storm from 20:00 to 10:00 next day.
        let hourly: Vec<(NaiveDateTime, f64)> = (0..35)
            .map(|h| {
                let wet = h < 8 || h >= 20;
                (t0 + chrono::Duration::hours(h), if wet { 5.0 } else { 0.0 })
            })
            .collect();

        // No 13 h dry spell, so the storm day closing at 09:00 is kept.
        let mut p = test_params();
        let totals = p.daily_totals(&hourly);
        assert_eq!(totals[18], 40.0);
        assert_eq!(totals[19], 65.0);

        // A 10 h dry spell ends the history at 20:00, before that day closes.
        p.event_gap_hours = 10;
        let totals = p.daily_totals(&hourly);
        assert_eq!(totals[18], 0.0);
        assert_eq!(totals[19], 40.0);
    }

    #[test]
    fn stations_iterate_upstream_first() {
        let s = sets(&["u1", "u2"], &["d1"]);
        assert_eq!(s.all().collect::<Vec<_>>(), vec!["u1", "u2", "d1"]);
    }
}
