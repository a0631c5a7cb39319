//! Error types for configuration and forecast input.
//!
//! Configuration problems are fatal and surface before any computation.
//! Once a run has started the numeric path never fails; it clamps instead.

use thiserror::Error;

/// Result alias for fallible configuration work.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for a forecast run.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Invalid or incomplete model configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} = {value} is out of bounds [{min}, {max}]")]
    OutOfBounds {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("level-storage table must be strictly increasing in both columns (row {row})")]
    NonMonotonicCurve { row: usize },

    #[error("level-storage table has {levels} levels but {storages} storages")]
    CurveShape { levels: usize, storages: usize },

    #[error("recession band limits must be strictly ascending (band {index})")]
    UnorderedBands { index: usize },

    #[error("no profile configured for reservoir {0}")]
    MissingReservoir(String),

    #[error("expected {expected} {name}, got {actual}")]
    WrongLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Inputs that cannot be turned into a forecast run.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{name} has {actual} steps, expected {expected}")]
    SeriesLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} contains non-finite values")]
    NonFinite(&'static str),

    #[error("forecast origin n1 = {n1} lies outside a series of {len} steps")]
    OriginOutOfRange { n1: usize, len: usize },

    #[error("no point rainfall for station {0}")]
    MissingStation(String),

    #[error("unknown reservoir code {0:?}")]
    UnknownReservoir(String),

    #[error("unknown runoff generator {0:?}")]
    UnknownGenerator(String),
}
