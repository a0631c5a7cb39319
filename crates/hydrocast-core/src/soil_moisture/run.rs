/// Soil-moisture generator orchestration.
///
/// - `step()`: one step, state in, state and fluxes out
/// - `SoilMoistureGenerator`: the [`RunoffGenerator`] implementation
use hydrocast_macros::StepSeries;

use super::params::Parameters;
use super::processes;
use super::state::State;
use crate::forcing::Sample;
use crate::impl_step_series_ops;
use crate::traits::{Generation, RunoffGenerator};

/// Single-step fluxes of the soil-moisture generator.
#[derive(Debug, Clone, Copy, StepSeries)]
pub struct Fluxes {
    pub precip: f64,
    pub evap: f64,
    pub pet: f64,
    pub evap_upper: f64,
    pub evap_lower: f64,
    pub evap_deep: f64,
    pub excess: f64,
    pub runoff: f64,
    pub runoff_fraction: f64,
    pub upper: f64,
    pub lower: f64,
    pub deep: f64,
}

impl_step_series_ops!(FluxesSeries, Fluxes);

/// Execute one step of the soil-moisture generator.
///
/// Evapotranspiration and runoff are computed from the state at the start of
/// the step; the layers are then updated by mass balance.
pub fn step(state: &State, params: &Parameters, precip: f64, evap: f64) -> (State, Fluxes) {
    let pet = params.kc * evap;

    // 1. Evapotranspiration split
    let layer_evap = processes::evapotranspiration(precip, pet, state, params);
    let excess = processes::rainfall_excess(precip, &layer_evap);

    // 2. Saturation-excess runoff
    let runoff = processes::saturation_excess(excess, state.total(), params.wm, params.b);
    let runoff_fraction = processes::runoff_fraction(runoff, excess);

    // 3. Layer update
    let new_state = processes::update_soil(state, precip, &layer_evap, runoff, params);

    let fluxes = Fluxes {
        precip,
        evap,
        pet,
        evap_upper: layer_evap.upper,
        evap_lower: layer_evap.lower,
        evap_deep: layer_evap.deep,
        excess,
        runoff,
        runoff_fraction,
        upper: new_state.upper,
        lower: new_state.lower,
        deep: new_state.deep,
    };

    (new_state, fluxes)
}

/// Soil-moisture accounting runoff generator.
#[derive(Debug, Clone, Copy)]
pub struct SoilMoistureGenerator {
    pub params: Parameters,
}

impl SoilMoistureGenerator {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }
}

impl RunoffGenerator for SoilMoistureGenerator {
    const NAME: &'static str = "soil-moisture";
    type State = State;
    type Fluxes = Fluxes;
    type Series = FluxesSeries;

    fn initial_state(&self) -> State {
        State::initialize(&self.params)
    }

    fn step(&self, state: &State, _t: usize, sample: Sample) -> (State, Fluxes, Generation) {
        let (new_state, fluxes) = step(state, &self.params, sample.precip, sample.evap);
        let generation = Generation {
            net_rainfall: fluxes.runoff,
            excess: fluxes.excess,
            runoff_depth: fluxes.runoff,
        };
        (new_state, fluxes, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::Forcing;

    fn test_params() -> Parameters {
        Parameters::new(0.9, 20.0, 70.0, 140.0, 0.3, 0.16).unwrap()
    }

    fn forcing(precip: &[f64], evap: &[f64]) -> Forcing {
        Forcing::assemble(precip.len() - 1, 0, precip, evap, &[], &[], &[]).unwrap()
    }

    // -- step() tests --

    #[test]
    fn step_returns_finite_values() {
        let p = test_params();
        let s = State::initialize(&p);
        let (new_state, fluxes) = step(&s, &p, 12.0, 0.3);
        assert!(new_state.total().is_finite());
        assert!(fluxes.runoff.is_finite());
        assert!(fluxes.runoff <= fluxes.excess);
    }

    #[test]
    fn step_does_not_mutate_input_state() {
        let p = test_params();
        let s = State::initialize(&p);
        let before = s;
        let _ = step(&s, &p, 12.0, 0.3);
        assert_eq!(s, before);
    }

    #[test]
    fn step_conserves_water() {
        let p = test_params();
        let s = State { upper: 5.0, lower: 20.0, deep: 10.0 };
        let (new_state, f) = step(&s, &p, 8.0, 0.5);
        let balance = s.total() + f.precip - f.evap_upper - f.evap_lower - f.evap_deep - f.runoff;
        assert!((new_state.total() - balance).abs() < 1e-9);
    }

    // -- run() tests --

    #[test]
    fn run_output_length_matches_input() {
        let g = SoilMoistureGenerator::new(test_params());
        let f = forcing(&[10.0, 5.0, 0.0, 15.0, 2.0], &[0.2; 5]);
        let out = g.run(&f, None);
        assert_eq!(out.fluxes.len(), 5);
        assert_eq!(out.generation.len(), 5);
    }

    #[test]
    fn soil_layers_stay_within_capacity() {
        let p = test_params();
        let g = SoilMoistureGenerator::new(p);
        let precip = [0.0, 80.0, 120.0, 0.0, 0.0, 3.0, 40.0, 0.0, 0.0, 0.0, 60.0, 0.0];
        let evap = [0.5, 0.1, 0.0, 2.0, 6.0, 0.3, 0.0, 8.0, 8.0, 8.0, 0.0, 1.0];
        let out = g.run(&forcing(&precip, &evap), None);
        for t in 0..out.fluxes.len() {
            assert!((0.0..=p.wum).contains(&out.fluxes.upper[t]), "upper at t={t}");
            assert!((0.0..=p.wlm).contains(&out.fluxes.lower[t]), "lower at t={t}");
            assert!((0.0..=p.wdm()).contains(&out.fluxes.deep[t]), "deep at t={t}");
        }
    }

    #[test]
    fn dry_weather_produces_nothing_and_drains_soil() {
        let p = test_params();
        let g = SoilMoistureGenerator::new(p);
        let out = g.run(&forcing(&[0.0; 8], &[3.0; 8]), None);
        assert!(out.generation.iter().all(|g| g.net_rainfall == 0.0 && g.excess == 0.0));
        let totals: Vec<f64> = (0..8)
            .map(|t| out.fluxes.upper[t] + out.fluxes.lower[t] + out.fluxes.deep[t])
            .collect();
        assert!(totals.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn custom_initial_state_changes_runoff() {
        let p = test_params();
        let g = SoilMoistureGenerator::new(p);
        let f = forcing(&[30.0; 3], &[0.0; 3]);
        let cold = g.run(&f, None);
        let wet = State { upper: p.wum, lower: p.wlm, deep: p.wdm() };
        let warm = g.run(&f, Some(&wet));
        assert!(warm.generation[0].net_rainfall > cold.generation[0].net_rainfall);
    }
}
