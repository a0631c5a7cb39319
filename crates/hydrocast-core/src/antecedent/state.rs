/// Antecedent-index generator state.
///
/// The regression is driven by event totals, so the state is the running
/// rainfall sum and the cumulative runoff of the previous step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct State {
    /// Rainfall accumulated since the start of the run [mm].
    pub cumulative_precip: f64,
    /// Cumulative runoff at the previous step, `None` before the first step [mm].
    pub cumulative_runoff: Option<f64>,
}

impl State {
    /// Net runoff increment for a new cumulative value. Zero on the first step.
    pub fn increment(&self, cumulative_runoff: f64) -> f64 {
        match self.cumulative_runoff {
            Some(previous) => cumulative_runoff - previous,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_increment_is_zero() {
        assert_eq!(State::default().increment(4.2), 0.0);
    }

    #[test]
    fn increment_is_first_difference() {
        let s = State { cumulative_precip: 10.0, cumulative_runoff: Some(1.5) };
        assert_eq!(s.increment(2.0), 0.5);
    }
}
