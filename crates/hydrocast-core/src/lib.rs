/// hydrocast — reservoir inflow and water-level forecasting engine.
///
/// Rainfall and evaporation pass through a runoff generator (soil-moisture
/// accounting or antecedent-index regression), a three-source partition and
/// unit-hydrograph confluence. The routed discharge is corrected against
/// observed inflow and by rule, then integrated into reservoir levels through
/// a level–storage curve.
pub mod antecedent;
pub mod config;
pub mod confluence;
pub mod correction;
pub mod error;
pub mod forcing;
pub mod level;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod record;
pub mod reservoir;
pub mod soil_moisture;
pub mod traits;

pub use config::HydrocastConfig;
pub use error::{ConfigError, ForecastError};
pub use pipeline::{run, run_both, Forecast, ForecastInput, GeneratorKind, InitialConditions};
pub use reservoir::{ReservoirKind, ReservoirProfile};
