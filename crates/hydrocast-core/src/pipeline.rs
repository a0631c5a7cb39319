//! Forecast orchestration.
//!
//! One run threads a single input through the chosen runoff generator, the
//! three-source partition, confluence, real-time correction, post-correction
//! and level reconstruction. All state lives in the run and is dropped with
//! it, so runs for different reservoirs can proceed in parallel.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::antecedent::run::AntecedentGenerator;
use crate::confluence;
use crate::correction::{self, flood::FloodMagnitude, flood::OffsetVariant};
use crate::error::{ForecastError, ForecastResult};
use crate::forcing::Forcing;
use crate::level::{self, LevelStorageCurve};
use crate::metrics::{self, Skill};
use crate::partition;
use crate::record::ForecastRecord;
use crate::reservoir::{ModelSetup, ReservoirKind, ReservoirProfile};
use crate::soil_moisture::run::SoilMoistureGenerator;
use crate::soil_moisture::state::State as SoilState;
use crate::traits::RunoffGenerator;

/// Runoff generator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// Three-layer soil-moisture accounting (XAJ).
    #[serde(rename = "XAJ")]
    SoilMoisture,
    /// Antecedent-index regression (PR).
    #[serde(rename = "PR")]
    AntecedentIndex,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 2] = [GeneratorKind::SoilMoisture, GeneratorKind::AntecedentIndex];

    pub fn code(self) -> &'static str {
        match self {
            GeneratorKind::SoilMoisture => "XAJ",
            GeneratorKind::AntecedentIndex => "PR",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GeneratorKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XAJ" | "SOIL-MOISTURE" => Ok(GeneratorKind::SoilMoisture),
            "PR" | "ANTECEDENT-INDEX" => Ok(GeneratorKind::AntecedentIndex),
            _ => Err(ForecastError::UnknownGenerator(s.to_string())),
        }
    }
}

/// Carry-over state supplied by the caller. Missing parts cold-start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Soil-moisture layers; half-full layers when absent.
    pub soil: Option<SoilState>,
    pub free_water: partition::State,
    pub routing: confluence::State,
}

/// Inputs of one forecast run.
#[derive(Debug, Clone)]
pub struct ForecastInput {
    /// Forecast origin, the time of step `n1`.
    pub start: NaiveDateTime,
    /// Index of the origin; steps `0..=n1` are history.
    pub n1: usize,
    pub forcing: Forcing,
    pub curve: LevelStorageCurve,
    /// Level at the origin [m].
    pub start_level: f64,
    /// Daily areal rainfall totals preceding the run, oldest first.
    pub daily_rainfall: Vec<f64>,
    /// Hourly rainfall per gauge, aligned with the forcing.
    pub point_rainfall: BTreeMap<String, Vec<f64>>,
    pub initial: InitialConditions,
}

impl ForecastInput {
    pub fn validate(&self) -> ForecastResult<()> {
        if self.n1 >= self.forcing.len() {
            return Err(ForecastError::OriginOutOfRange {
                n1: self.n1,
                len: self.forcing.len(),
            });
        }
        if !self.start_level.is_finite() {
            return Err(ForecastError::NonFinite("start_level"));
        }
        Ok(())
    }

    /// Timestamp of step `i`.
    pub fn time_at(&self, i: usize) -> NaiveDateTime {
        self.start - Duration::hours(self.n1 as i64) + Duration::hours(i as i64)
    }
}

/// Result of one forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub reservoir: ReservoirKind,
    pub generator: GeneratorKind,
    pub records: Vec<ForecastRecord>,
    /// Generator runoff per step; cumulative for the antecedent generator [mm].
    pub runoff_depth: Vec<f64>,
    /// Routed discharge before any correction [m3/s].
    pub routed_discharge: Vec<f64>,
    pub flood: FloodMagnitude,
    pub offset_variant: OffsetVariant,
    pub anchors: Vec<usize>,
    /// Skill of the final discharge against observed inflow.
    pub skill: Option<Skill>,
    /// Antecedent index of the run; absent for the soil-moisture generator.
    pub antecedent: Option<AntecedentSummary>,
}

/// Antecedent precipitation index and the decay factor it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntecedentSummary {
    /// Pa [mm].
    pub pa: f64,
    /// K [-].
    pub decay: f64,
}

impl Forecast {
    pub fn discharge(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.discharge).collect()
    }
}

/// Forecasts of both generators on one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPair {
    pub soil_moisture: Forecast,
    pub antecedent: Forecast,
}

/// Run one forecast.
pub fn run(
    profile: &ReservoirProfile,
    reservoir: ReservoirKind,
    generator: GeneratorKind,
    input: &ForecastInput,
) -> ForecastResult<Forecast> {
    profile.validate()?;
    input.validate()?;

    info!(
        %reservoir,
        %generator,
        steps = input.forcing.len(),
        n1 = input.n1,
        "forecast run started"
    );

    let forecast = match generator {
        GeneratorKind::SoilMoisture => {
            let model = SoilMoistureGenerator::new(profile.soil_moisture.generator);
            let initial = input.initial.soil.map(|s| s.clamped(&model.params));
            forecast_with(&model, initial.as_ref(), &profile.soil_moisture, profile, reservoir, generator, input)
        }
        GeneratorKind::AntecedentIndex => {
            let model = AntecedentGenerator::new(
                &profile.antecedent.generator,
                input.start,
                &input.daily_rainfall,
                &input.point_rainfall,
            )?;
            let mut forecast = forecast_with(&model, None, &profile.antecedent, profile, reservoir, generator, input);
            forecast.antecedent = Some(AntecedentSummary {
                pa: model.pa(),
                decay: model.decay(),
            });
            forecast
        }
    };

    info!(
        %reservoir,
        %generator,
        flood = ?forecast.flood,
        anchors = forecast.anchors.len(),
        "forecast run finished"
    );
    Ok(forecast)
}

/// Run both generators on the same input.
pub fn run_both(
    profile: &ReservoirProfile,
    reservoir: ReservoirKind,
    input: &ForecastInput,
) -> ForecastResult<ForecastPair> {
    Ok(ForecastPair {
        soil_moisture: run(profile, reservoir, GeneratorKind::SoilMoisture, input)?,
        antecedent: run(profile, reservoir, GeneratorKind::AntecedentIndex, input)?,
    })
}

fn forecast_with<G: RunoffGenerator, P>(
    model: &G,
    initial_state: Option<&G::State>,
    setup: &ModelSetup<P>,
    profile: &ReservoirProfile,
    reservoir: ReservoirKind,
    generator: GeneratorKind,
    input: &ForecastInput,
) -> Forecast {
    let forcing = &input.forcing;
    let n1 = input.n1;

    let generated = model.run(forcing, initial_state);
    let components = partition::run(&setup.partition, &generated.generation, Some(&input.initial.free_water));
    let routed = confluence::route(&setup.routing, &components, Some(&input.initial.routing));
    debug!(model = G::NAME, steps = routed.len(), "runoff routed");

    let flood = profile.flood.classify(&forcing.precip, n1);
    debug!(?flood, "flood magnitude classified");
    let corrected = correction::correct_realtime(
        &routed.discharge,
        &forcing.observed_inflow,
        &forcing.precip,
        flood,
        &profile.flood,
        &setup.peak_offsets,
    );

    let mut discharge = corrected.discharge;
    profile.post_correction.apply(&mut discharge, &forcing.precip, n1);

    let zeros = vec![0.0; discharge.len()];
    let rainfall_only = level::reconstruct(&input.curve, &discharge, &zeros, &zeros, n1, input.start_level);
    let full = level::reconstruct(
        &input.curve,
        &discharge,
        &forcing.external_inflow,
        &forcing.external_outflow,
        n1,
        input.start_level,
    );

    let records = discharge
        .iter()
        .zip(rainfall_only.iter().zip(&full))
        .enumerate()
        .map(|(i, (&q, (&z_rain, &z_full)))| ForecastRecord {
            time: input.time_at(i),
            discharge: q,
            level_rainfall_only: z_rain,
            level_full: z_full,
        })
        .collect();

    Forecast {
        reservoir,
        generator,
        records,
        runoff_depth: generated.runoff_depth(),
        skill: metrics::paired_skill(&discharge, &forcing.observed_inflow),
        routed_discharge: routed.discharge,
        flood,
        offset_variant: corrected.variant,
        anchors: corrected.anchors,
        antecedent: None,
    }
}
