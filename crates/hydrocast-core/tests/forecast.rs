//! End-to-end forecast runs through the public API.
use std::collections::BTreeMap;

use approx::assert_relative_eq;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use hydrocast_core::confluence;
use hydrocast_core::correction::flood::{FloodMagnitude, OffsetVariant};
use hydrocast_core::correction::recession::PostCorrection;
use hydrocast_core::forcing::{observed_from_sentinel, Forcing};
use hydrocast_core::level::{self, LevelStorageCurve};
use hydrocast_core::soil_moisture::run::SoilMoistureGenerator;
use hydrocast_core::traits::RunoffGenerator;
use hydrocast_core::{
    run, run_both, ForecastInput, GeneratorKind, HydrocastConfig, InitialConditions,
    ReservoirKind, ReservoirProfile,
};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 15)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap()
}

fn curve() -> LevelStorageCurve {
    LevelStorageCurve::from_pairs(&[(20.0, 100.0), (25.0, 500.0), (30.0, 1200.0)]).unwrap()
}

struct Scenario {
    precip: Vec<f64>,
    observed: Vec<Option<f64>>,
    inflow: Vec<f64>,
    outflow: Vec<f64>,
    n1: usize,
    initial: InitialConditions,
}

impl Scenario {
    fn new(precip: Vec<f64>, n1: usize) -> Self {
        Self {
            precip,
            observed: vec![],
            inflow: vec![],
            outflow: vec![],
            n1,
            initial: InitialConditions::default(),
        }
    }

    fn input(&self, profile: &ReservoirProfile) -> ForecastInput {
        let n = self.precip.len();
        let evap = vec![0.15; n];
        let point_rainfall: BTreeMap<String, Vec<f64>> = profile
            .antecedent
            .generator
            .stations
            .for_year(start().year())
            .all()
            .map(|s| (s.to_string(), self.precip.clone()))
            .collect();
        ForecastInput {
            start: start(),
            n1: self.n1,
            forcing: Forcing::assemble(
                self.n1,
                n - self.n1 - 1,
                &self.precip,
                &evap,
                &self.observed,
                &self.inflow,
                &self.outflow,
            )
            .unwrap(),
            curve: curve(),
            start_level: 25.0,
            daily_rainfall: vec![4.0; 20],
            point_rainfall,
            initial: self.initial,
        }
    }
}

fn storm(n: usize, from: usize, to: usize, depth: f64) -> Vec<f64> {
    (0..n).map(|t| if (from..to).contains(&t) { depth } else { 0.0 }).collect()
}

#[test]
fn level_at_origin_is_the_start_level_for_both_generators() {
    let profile = ReservoirProfile::dongpu();
    let mut scenario = Scenario::new(storm(72, 20, 40, 6.0), 48);
    scenario.inflow = vec![12.0];
    scenario.outflow = vec![30.0];
    let input = scenario.input(&profile);

    let pair = run_both(&profile, ReservoirKind::Dongpu, &input).unwrap();
    for forecast in [&pair.soil_moisture, &pair.antecedent] {
        let origin = &forecast.records[48];
        assert_eq!(origin.level_full, Some(25.0));
        assert_eq!(origin.level_rainfall_only, Some(25.0));
        assert!(forecast.records[..48].iter().all(|r| r.level_full.is_none()));
        assert!(forecast.records[49..].iter().all(|r| r.level_full.is_some()));
        assert!(forecast.records.iter().all(|r| r.discharge.is_finite()));
    }
}

#[test]
fn constant_discharge_level_scenario() {
    let n1 = 2;
    let discharge = vec![50.0; n1 + 4];
    let zeros = vec![0.0; discharge.len()];
    let levels = level::reconstruct(&curve(), &discharge, &zeros, &zeros, n1, 25.0);
    assert_relative_eq!(levels[n1 + 3].unwrap(), 25.385_714_285_714_29, epsilon = 1e-9);
}

#[test]
fn dry_run_produces_no_runoff_and_keeps_level() {
    let profile = ReservoirProfile::dongpu();
    let input = Scenario::new(vec![0.0; 60], 30).input(&profile);

    let forecast = run(&profile, ReservoirKind::Dongpu, GeneratorKind::SoilMoisture, &input).unwrap();
    assert!(forecast.routed_discharge.iter().all(|&q| q == 0.0));
    assert_eq!(forecast.flood, FloodMagnitude::None);
    for record in &forecast.records[30..] {
        assert_eq!(record.discharge, 0.0);
        assert_eq!(record.level_rainfall_only, Some(25.0));
    }
}

#[test]
fn dry_soil_never_gains_water() {
    let profile = ReservoirProfile::dafangying();
    let model = SoilMoistureGenerator::new(profile.soil_moisture.generator);
    let forcing = Forcing::assemble(99, 0, &[0.0; 100], &[0.4; 100], &[], &[], &[]).unwrap();
    let out = model.run(&forcing, None);
    let total: Vec<f64> = (0..100)
        .map(|t| out.fluxes.upper[t] + out.fluxes.lower[t] + out.fluxes.deep[t])
        .collect();
    assert!(total.windows(2).all(|w| w[1] <= w[0] + 1e-12));
    assert!(out.generation.iter().all(|g| g.net_rainfall == 0.0));
}

#[test]
fn observations_matching_the_forecast_change_nothing() {
    let profile = ReservoirProfile::dongpu();
    // No rain in the first 47 steps, so the flood offset stays inactive.
    let mut scenario = Scenario::new(storm(96, 50, 58, 8.0), 60);
    scenario.initial.routing = confluence::State {
        interflow: 15.0,
        groundwater: 25.0,
    };
    let blind = run(&profile, ReservoirKind::Dongpu, GeneratorKind::SoilMoisture, &scenario.input(&profile)).unwrap();
    assert_eq!(blind.offset_variant, OffsetVariant::Uncorrected);

    scenario.observed = blind.routed_discharge[..=60].iter().copied().map(Some).collect();
    let informed = run(&profile, ReservoirKind::Dongpu, GeneratorKind::SoilMoisture, &scenario.input(&profile)).unwrap();
    assert_eq!(informed.offset_variant, OffsetVariant::Corrected);
    assert!(!informed.anchors.is_empty());
    assert_eq!(informed.discharge(), blind.discharge());
    let skill = informed.skill.unwrap();
    assert_eq!(skill.pairs, 61);
}

#[test]
fn dry_weather_recession_is_monotone() {
    let profile = ReservoirProfile::dongpu();
    let mut scenario = Scenario::new(vec![0.0; 80], 20);
    scenario.initial.routing = confluence::State {
        interflow: 10.0,
        groundwater: 18.0,
    };
    let forecast = run(&profile, ReservoirKind::Dongpu, GeneratorKind::AntecedentIndex, &scenario.input(&profile)).unwrap();
    let q = forecast.discharge();
    assert!(q.windows(2).all(|w| w[1] <= w[0]));
    let first_small = q.iter().position(|&v| v < 0.6);
    assert!(first_small.is_some(), "recession never dropped below 0.6: {q:?}");
    let first_small = first_small.unwrap();
    assert!(q[first_small + 1..].iter().all(|&v| v == 0.0));
    assert!(first_small + 1 < q.len());
}

#[test]
fn drought_bias_scenario() {
    let mut q = vec![10.0, 12.0, 8.0];
    PostCorrection::default().apply(&mut q, &[1.0, 1.0, 1.0], 2);
    assert_eq!(q, vec![0.0, 0.0, 0.0]);
}

#[test]
fn sentinel_observations_feed_the_correction() {
    let profile = ReservoirProfile::dafangying();
    let mut scenario = Scenario::new(storm(72, 48, 60, 5.0), 40);
    scenario.initial.routing = confluence::State {
        interflow: 20.0,
        groundwater: 20.0,
    };
    let raw = [-1.0, -1.0, 30.0, 31.0, 32.0, 33.0, 34.0, 35.0, -1.0, 36.0];
    scenario.observed = observed_from_sentinel(&raw);
    let forecast = run(&profile, ReservoirKind::Dafangying, GeneratorKind::SoilMoisture, &scenario.input(&profile)).unwrap();
    // The run 2..=5 anchors at 5 and the chain breaks at the gap at 8.
    assert_eq!(forecast.anchors, vec![5]);
}

#[test]
fn storm_raises_discharge_over_the_horizon() {
    let profile = ReservoirProfile::dongpu();
    let input = Scenario::new(storm(96, 10, 30, 12.0), 36).input(&profile);
    let forecast = run(&profile, ReservoirKind::Dongpu, GeneratorKind::SoilMoisture, &input).unwrap();
    let peak = forecast.routed_discharge.iter().copied().fold(0.0, f64::max);
    assert!(peak > 0.0);
    assert_eq!(forecast.flood, FloodMagnitude::Major);
    let last = forecast.records.last().unwrap();
    assert!(last.level_rainfall_only.unwrap() > 25.0);
}

#[test]
fn configured_profiles_drive_a_run() {
    let json = HydrocastConfig::default().to_json_pretty().unwrap();
    let config = HydrocastConfig::from_json_str(&json).unwrap();
    let profile = config.profile(ReservoirKind::Dafangying).unwrap();
    let input = Scenario::new(storm(48, 5, 15, 4.0), 24).input(profile);
    let forecast = run(profile, ReservoirKind::Dafangying, GeneratorKind::AntecedentIndex, &input).unwrap();
    assert_eq!(forecast.records.len(), 48);
    assert_eq!(forecast.runoff_depth.len(), 48);
    // Every gauge sees the same rain, so the centre stays upstream and the
    // cumulative runoff never falls.
    assert!(forecast.runoff_depth.windows(2).all(|w| w[1] >= w[0]));
}
