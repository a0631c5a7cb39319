/// Soil-moisture accounting runoff generator.
///
/// Three-layer tension-water model (upper, lower, deep) with saturation-excess
/// runoff from a parabolic storage-capacity curve. Produces the net rainfall
/// increment for the three-source partition.
pub mod constants;
pub mod params;
pub mod processes;
pub mod run;
pub mod state;
