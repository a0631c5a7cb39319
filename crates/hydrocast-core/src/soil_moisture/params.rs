/// Soil-moisture generator parameters.
///
/// - `kc`: ratio of potential evapotranspiration to pan evaporation [-]
/// - `wum`: upper-layer tension-water capacity [mm]
/// - `wlm`: lower-layer tension-water capacity [mm]
/// - `wm`: areal mean tension-water capacity of all three layers [mm]
/// - `b`: exponent of the storage-capacity distribution curve [-]
/// - `c`: deep-layer evapotranspiration coefficient [-]
use serde::{Deserialize, Serialize};

use super::constants::{ALL_BOUNDS, N_PARAMS, PARAM_NAMES};
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub kc: f64,
    pub wum: f64,
    pub wlm: f64,
    pub wm: f64,
    pub b: f64,
    pub c: f64,
}

impl Parameters {
    /// Create new Parameters, returning an error if any value is out of bounds
    /// or the upper and lower layers do not fit inside `wm`.
    pub fn new(kc: f64, wum: f64, wlm: f64, wm: f64, b: f64, c: f64) -> ConfigResult<Self> {
        let p = Self {
            kc,
            wum,
            wlm,
            wm,
            b,
            c,
        };
        p.validate()?;
        Ok(p)
    }

    /// Check bounds and layer consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        for (i, &value) in self.to_array().iter().enumerate() {
            let bounds = ALL_BOUNDS[i];
            if !(bounds.min..=bounds.max).contains(&value) {
                return Err(ConfigError::OutOfBounds {
                    name: PARAM_NAMES[i],
                    value,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        if self.wum + self.wlm > self.wm {
            return Err(ConfigError::OutOfBounds {
                name: "wum + wlm",
                value: self.wum + self.wlm,
                min: 0.0,
                max: self.wm,
            });
        }
        Ok(())
    }

    /// Deep-layer capacity WDM = WM - WUM - WLM [mm].
    pub fn wdm(&self) -> f64 {
        self.wm - self.wum - self.wlm
    }

    /// Create Parameters from a 6-element slice.
    pub fn from_array(arr: &[f64]) -> ConfigResult<Self> {
        if arr.len() != N_PARAMS {
            return Err(ConfigError::WrongLength {
                name: "soil-moisture parameters",
                expected: N_PARAMS,
                actual: arr.len(),
            });
        }
        Self::new(arr[0], arr[1], arr[2], arr[3], arr[4], arr[5])
    }

    /// Convert to a 6-element array.
    pub fn to_array(&self) -> [f64; N_PARAMS] {
        [self.kc, self.wum, self.wlm, self.wm, self.b, self.c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_params() -> Parameters {
        Parameters::new(0.9, 20.0, 70.0, 140.0, 0.3, 0.16).unwrap()
    }

    #[test]
    fn valid_parameters() {
        let p = valid_params();
        assert_eq!(p.wum, 20.0);
        assert_eq!(p.wdm(), 50.0);
    }

    #[test]
    fn b_out_of_bounds() {
        let err = Parameters::new(0.9, 20.0, 70.0, 140.0, 3.0, 0.16).unwrap_err();
        assert!(err.to_string().starts_with("b = 3"));
    }

    #[test]
    fn layers_must_fit_inside_wm() {
        assert!(Parameters::new(0.9, 60.0, 90.0, 140.0, 0.3, 0.16).is_err());
    }

    #[test]
    fn from_array_roundtrip() {
        let p = valid_params();
        let p2 = Parameters::from_array(&p.to_array()).unwrap();
        assert_eq!(p, p2);
    }

    #[test]
    fn from_array_wrong_length() {
        assert!(Parameters::from_array(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn deserializes_and_validates() {
        let p: Parameters =
            serde_json::from_str(r#"{"kc":0.9,"wum":20,"wlm":70,"wm":140,"b":0.3,"c":0.16}"#)
                .unwrap();
        assert!(p.validate().is_ok());
    }
}
