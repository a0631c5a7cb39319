/// Antecedent-index regression runoff generator.
///
/// Empirical alternative to soil-moisture accounting: a decayed antecedent
/// precipitation index Pa plus cumulative event rainfall drives a power law
/// whose coefficients depend on where the rainstorm is centred.
pub mod constants;
pub mod params;
pub mod processes;
pub mod run;
pub mod state;
