use crate::forcing::{Forcing, Sample};

/// What a runoff generator hands to the three-source partition for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Generation {
    /// Incremental net rainfall R' [mm].
    pub net_rainfall: f64,
    /// Rainfall excess PE [mm].
    pub excess: f64,
    /// Generator-specific runoff depth reported with the forecast [mm].
    pub runoff_depth: f64,
}

/// Common interface of the interchangeable runoff generators.
///
/// A generator turns one rainfall/evaporation sample plus its own state into a
/// [`Generation`]. Everything downstream of the generator is shared, so either
/// implementation can be swapped in without touching the later stages.
pub trait RunoffGenerator {
    const NAME: &'static str;
    type State: Clone;
    type Fluxes: Copy;
    type Series: StepSeriesOps<Self::Fluxes>;

    /// Cold-start state.
    fn initial_state(&self) -> Self::State;

    /// Execute step `t`: given state and forcing, return the new state,
    /// diagnostic fluxes and the generation handed downstream.
    fn step(&self, state: &Self::State, t: usize, sample: Sample)
        -> (Self::State, Self::Fluxes, Generation);

    /// Run the generator over the whole forcing series.
    fn run(&self, forcing: &Forcing, initial_state: Option<&Self::State>) -> GeneratorRun<Self::Series> {
        let mut state = match initial_state {
            Some(s) => s.clone(),
            None => self.initial_state(),
        };

        let n = forcing.len();
        let mut fluxes = Self::Series::with_capacity(n);
        let mut generation = Vec::with_capacity(n);

        for t in 0..n {
            let (new_state, f, g) = self.step(&state, t, forcing.sample(t));
            fluxes.push(&f);
            generation.push(g);
            state = new_state;
        }

        GeneratorRun { fluxes, generation }
    }
}

/// Output of [`RunoffGenerator::run`].
#[derive(Debug, Clone)]
pub struct GeneratorRun<S> {
    pub fluxes: S,
    pub generation: Vec<Generation>,
}

impl<S> GeneratorRun<S> {
    /// Runoff depth per step, as reported with the forecast.
    pub fn runoff_depth(&self) -> Vec<f64> {
        self.generation.iter().map(|g| g.runoff_depth).collect()
    }
}

/// Operations required on a columnar per-step series.
pub trait StepSeriesOps<F> {
    fn with_capacity(n: usize) -> Self;
    fn push(&mut self, f: &F);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// Implement [`StepSeriesOps`] for a `#[derive(StepSeries)]` pair by
/// forwarding to the generated inherent methods.
#[macro_export]
macro_rules! impl_step_series_ops {
    ($series:ty, $step:ty) => {
        impl $crate::traits::StepSeriesOps<$step> for $series {
            fn with_capacity(n: usize) -> Self {
                <$series>::with_capacity(n)
            }
            fn push(&mut self, f: &$step) {
                <$series>::push(self, f)
            }
            fn len(&self) -> usize {
                <$series>::len(self)
            }
            fn is_empty(&self) -> bool {
                <$series>::is_empty(self)
            }
        }
    };
}
