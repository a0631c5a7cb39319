/// Soil-moisture generator state: tension-water content of each layer [mm].
///
/// Invariants after every step: `0 <= upper <= WUM`, `0 <= lower <= WLM`,
/// `0 <= deep <= WM - WUM - WLM`.
use serde::{Deserialize, Serialize};

use super::constants::{INIT_DEEP_FRACTION, INIT_LOWER_FRACTION, INIT_UPPER_FRACTION, STATE_SIZE};
use super::params::Parameters;
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub upper: f64,
    pub lower: f64,
    pub deep: f64,
}

impl State {
    /// Cold-start state: every layer half full.
    pub fn initialize(params: &Parameters) -> Self {
        Self {
            upper: INIT_UPPER_FRACTION * params.wum,
            lower: INIT_LOWER_FRACTION * params.wlm,
            deep: INIT_DEEP_FRACTION * params.wdm(),
        }
    }

    /// Total tension water W0 [mm].
    pub fn total(&self) -> f64 {
        self.upper + self.lower + self.deep
    }

    /// Clamp each layer into its capacity range.
    pub fn clamped(self, params: &Parameters) -> Self {
        Self {
            upper: self.upper.clamp(0.0, params.wum),
            lower: self.lower.clamp(0.0, params.wlm),
            deep: self.deep.clamp(0.0, params.wdm()),
        }
    }

    /// Layout: [upper, lower, deep]
    pub fn to_array(&self) -> [f64; STATE_SIZE] {
        [self.upper, self.lower, self.deep]
    }

    /// Reconstruct State from a 3-element slice.
    pub fn from_slice(arr: &[f64]) -> ConfigResult<Self> {
        if arr.len() != STATE_SIZE {
            return Err(ConfigError::WrongLength {
                name: "soil-moisture state elements",
                expected: STATE_SIZE,
                actual: arr.len(),
            });
        }
        Ok(Self {
            upper: arr[0],
            lower: arr[1],
            deep: arr[2],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> Parameters {
        Parameters::new(0.9, 20.0, 70.0, 140.0, 0.3, 0.16).unwrap()
    }

    #[test]
    fn initialize_half_full() {
        let s = State::initialize(&test_params());
        assert_eq!(s.upper, 10.0);
        assert_eq!(s.lower, 35.0);
        assert_eq!(s.deep, 25.0);
        assert_eq!(s.total(), 70.0);
    }

    #[test]
    fn clamped_respects_capacities() {
        let p = test_params();
        let s = State {
            upper: 25.0,
            lower: -3.0,
            deep: 80.0,
        }
        .clamped(&p);
        assert_eq!(s.to_array(), [20.0, 0.0, 50.0]);
    }

    #[test]
    fn roundtrip_array_conversion() {
        let s = State::initialize(&test_params());
        let s2 = State::from_slice(&s.to_array()).unwrap();
        assert_eq!(s, s2);
    }

    #[test]
    fn from_slice_wrong_length() {
        assert!(State::from_slice(&[1.0, 2.0]).is_err());
    }
}
