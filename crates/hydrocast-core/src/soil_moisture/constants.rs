/// Soil-moisture generator constants and parameter contract.

/// Parameter names in order.
pub const PARAM_NAMES: &[&str] = &["kc", "wum", "wlm", "wm", "b", "c"];

/// Number of parameters.
pub const N_PARAMS: usize = 6;

/// Number of elements in the state array representation.
pub const STATE_SIZE: usize = 3;

/// Parameter bounds: (min, max).
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// Evaporation conversion factor (pan to potential) [-].
pub const KC_BOUNDS: Bounds = Bounds { min: 0.1, max: 2.0 };

/// Upper-layer tension-water capacity [mm].
pub const WUM_BOUNDS: Bounds = Bounds { min: 1.0, max: 100.0 };

/// Lower-layer tension-water capacity [mm].
pub const WLM_BOUNDS: Bounds = Bounds { min: 1.0, max: 200.0 };

/// Areal mean tension-water capacity [mm].
pub const WM_BOUNDS: Bounds = Bounds { min: 10.0, max: 400.0 };

/// Storage-capacity curve exponent [-].
pub const B_BOUNDS: Bounds = Bounds { min: 0.05, max: 2.0 };

/// Deep-layer evapotranspiration coefficient [-].
pub const C_BOUNDS: Bounds = Bounds { min: 0.0, max: 0.5 };

/// Bounds in `PARAM_NAMES` order.
pub const ALL_BOUNDS: [Bounds; N_PARAMS] =
    [KC_BOUNDS, WUM_BOUNDS, WLM_BOUNDS, WM_BOUNDS, B_BOUNDS, C_BOUNDS];

// -- Cold-start fill fractions --

/// Initial upper-layer fill as a fraction of WUM.
pub const INIT_UPPER_FRACTION: f64 = 0.5;

/// Initial lower-layer fill as a fraction of WLM.
pub const INIT_LOWER_FRACTION: f64 = 0.5;

/// Initial deep-layer fill as a fraction of its capacity.
pub const INIT_DEEP_FRACTION: f64 = 0.5;
