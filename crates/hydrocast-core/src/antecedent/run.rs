/// Antecedent-index generator orchestration.
use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDateTime};
use hydrocast_macros::StepSeries;
use tracing::{debug, warn};

use super::constants::DECAY_MONTH_LOOKAHEAD_HOURS;
use super::params::{Parameters, StationSets};
use super::processes::{self, StormCentre};
use super::state::State;
use crate::error::{ForecastError, ForecastResult};
use crate::forcing::Sample;
use crate::impl_step_series_ops;
use crate::traits::{Generation, RunoffGenerator};

/// Single-step fluxes of the antecedent-index generator.
#[derive(Debug, Clone, Copy, StepSeries)]
pub struct Fluxes {
    pub precip: f64,
    pub evap: f64,
    pub pet: f64,
    pub excess: f64,
    pub cumulative_precip: f64,
    pub cumulative_runoff: f64,
    pub net_rainfall: f64,
    /// 1 when the rainstorm is centred upstream, 0 downstream.
    pub upstream_centre: f64,
}

impl_step_series_ops!(FluxesSeries, Fluxes);

/// Antecedent-index regression runoff generator for one forecast run.
///
/// Pa and the decay factor are fixed when the generator is built; the station
/// set is chosen by the year of the forecast start.
#[derive(Debug, Clone)]
pub struct AntecedentGenerator<'a> {
    params: &'a Parameters,
    stations: &'a StationSets,
    point_rainfall: &'a BTreeMap<String, Vec<f64>>,
    decay: f64,
    pa: f64,
}

impl<'a> AntecedentGenerator<'a> {
    /// Prepare the generator for a run starting at `start`.
    ///
    /// Fails if a station of the active set has no point-rainfall series.
    pub fn new(
        params: &'a Parameters,
        start: NaiveDateTime,
        daily_totals: &[f64],
        point_rainfall: &'a BTreeMap<String, Vec<f64>>,
    ) -> ForecastResult<Self> {
        let stations = params.stations.for_year(start.year());
        if let Some(missing) = stations.all().find(|s| !point_rainfall.contains_key(*s)) {
            return Err(ForecastError::MissingStation(missing.to_string()));
        }

        let month = (start + Duration::hours(DECAY_MONTH_LOOKAHEAD_HOURS)).month();
        let decay = params.decay_for_month(month);
        let pa = processes::antecedent_index(daily_totals, decay);
        if pa == 0.0 && daily_totals.iter().any(|v| !v.is_finite()) {
            warn!("non-finite daily rainfall, antecedent index reset to 0");
        }
        debug!(month, decay, pa, "antecedent index");

        Ok(Self {
            params,
            stations,
            point_rainfall,
            decay,
            pa,
        })
    }

    /// Antecedent precipitation index used for this run [mm].
    pub fn pa(&self) -> f64 {
        self.pa
    }

    /// Decay factor K for this run.
    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn storm_centre(&self, t: usize) -> StormCentre {
        processes::storm_centre(self.stations, self.point_rainfall, t)
    }
}

impl RunoffGenerator for AntecedentGenerator<'_> {
    const NAME: &'static str = "antecedent-index";
    type State = State;
    type Fluxes = Fluxes;
    type Series = FluxesSeries;

    fn initial_state(&self) -> State {
        State::default()
    }

    fn step(&self, state: &State, t: usize, sample: Sample) -> (State, Fluxes, Generation) {
        let cumulative_precip = state.cumulative_precip + sample.precip;

        let centre = self.storm_centre(t);
        let cumulative_runoff =
            processes::cumulative_runoff(centre.law(self.params), cumulative_precip, self.pa);
        let net_rainfall = state.increment(cumulative_runoff);

        let pet = self.params.kc * sample.evap;
        let excess = processes::rainfall_excess(sample.precip, pet);

        let new_state = State {
            cumulative_precip,
            cumulative_runoff: Some(cumulative_runoff),
        };
        let fluxes = Fluxes {
            precip: sample.precip,
            evap: sample.evap,
            pet,
            excess,
            cumulative_precip,
            cumulative_runoff,
            net_rainfall,
            upstream_centre: centre.as_flag(),
        };
        let generation = Generation {
            net_rainfall,
            excess,
            runoff_depth: cumulative_runoff,
        };
        (new_state, fluxes, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antecedent::params::{PowerLaw, StationNetwork};
    use crate::forcing::Forcing;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn params() -> Parameters {
        Parameters {
            kc: 0.9,
            decay_by_month: [0.8, 0.8, 0.8, 0.8, 0.8, 0.8, 0.9, 0.9, 0.9, 0.9, 0.9, 0.9],
            upstream: PowerLaw { coefficient: 0.0006, exponent: 2.15 },
            downstream: PowerLaw { coefficient: 0.0009, exponent: 2.17 },
            stations: StationNetwork {
                cutoff_year: 2018,
                legacy: Some(StationSets {
                    upstream: vec!["old".into()],
                    downstream: vec!["d1".into()],
                }),
                current: StationSets {
                    upstream: vec!["u1".into()],
                    downstream: vec!["d1".into()],
                },
            },
            event_gap_hours: 13,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn point_rain(n: usize) -> BTreeMap<String, Vec<f64>> {
        let mut map = BTreeMap::new();
        map.insert("u1".to_string(), vec![2.0; n]);
        map.insert("d1".to_string(), vec![1.0; n]);
        map
    }

    #[test]
    fn decay_month_taken_47_hours_ahead() {
        let p = params();
        let rain = point_rain(4);
        // 30 June 02:00 + 47 h falls in July.
        let g = AntecedentGenerator::new(&p, at(2023, 6, 30, 2), &[0.0; 20], &rain).unwrap();
        assert_eq!(g.decay(), 0.9);
        let g = AntecedentGenerator::new(&p, at(2023, 6, 1, 2), &[0.0; 20], &rain).unwrap();
        assert_eq!(g.decay(), 0.8);
    }

    #[test]
    fn missing_station_is_rejected() {
        let p = params();
        let rain = point_rain(4);
        // 2015 uses the legacy set, which needs "old".
        let err = AntecedentGenerator::new(&p, at(2015, 7, 1, 8), &[0.0; 20], &rain).unwrap_err();
        assert!(matches!(err, ForecastError::MissingStation(ref s) if s == "old"));
    }

    #[test]
    fn first_step_has_zero_net_rainfall() {
        let p = params();
        let rain = point_rain(3);
        let g = AntecedentGenerator::new(&p, at(2023, 7, 1, 8), &[10.0; 20], &rain).unwrap();
        let forcing = Forcing::assemble(2, 0, &[5.0, 5.0, 5.0], &[0.2; 3], &[], &[], &[]).unwrap();
        let out = g.run(&forcing, None);
        assert_eq!(out.generation[0].net_rainfall, 0.0);
        assert!(out.generation[1].net_rainfall > 0.0);
    }

    #[test]
    fn net_rainfall_sums_to_cumulative_change() {
        let p = params();
        let rain = point_rain(6);
        let g = AntecedentGenerator::new(&p, at(2023, 7, 1, 8), &[5.0; 20], &rain).unwrap();
        let forcing = Forcing::assemble(5, 0, &[1.0, 4.0, 8.0, 3.0, 0.0, 2.0], &[0.1; 6], &[], &[], &[])
            .unwrap();
        let out = g.run(&forcing, None);
        let total: f64 = out.generation.iter().map(|g| g.net_rainfall).sum();
        let depth = out.runoff_depth();
        assert_relative_eq!(total, depth[5] - depth[0], epsilon = 1e-9);
    }

    #[test]
    fn upstream_storm_uses_upstream_law() {
        let p = params();
        let rain = point_rain(2);
        let g = AntecedentGenerator::new(&p, at(2023, 7, 1, 8), &[0.0; 20], &rain).unwrap();
        let (_, f, _) = g.step(&State::default(), 0, Sample { precip: 10.0, evap: 0.0 });
        assert_eq!(f.upstream_centre, 1.0);
        assert_relative_eq!(f.cumulative_runoff, p.upstream.apply(10.0), epsilon = 1e-12);
    }

    #[test]
    fn excess_uses_kc() {
        let p = params();
        let rain = point_rain(1);
        let g = AntecedentGenerator::new(&p, at(2023, 7, 1, 8), &[0.0; 20], &rain).unwrap();
        let (_, _, generation) = g.step(&State::default(), 0, Sample { precip: 1.0, evap: 1.0 });
        assert_relative_eq!(generation.excess, 0.1, epsilon = 1e-12);
    }
}
