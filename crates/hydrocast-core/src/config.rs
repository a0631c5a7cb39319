//! JSON configuration of the reservoir profiles.
//!
//! ```json
//! { "reservoirs": { "dongpu": { ... }, "dafangying": { ... } } }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::reservoir::{ReservoirKind, ReservoirProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrocastConfig {
    pub reservoirs: BTreeMap<ReservoirKind, ReservoirProfile>,
}

impl Default for HydrocastConfig {
    /// Built-in profiles for every supported reservoir.
    fn default() -> Self {
        Self {
            reservoirs: ReservoirKind::ALL
                .iter()
                .map(|&kind| (kind, ReservoirProfile::builtin(kind)))
                .collect(),
        }
    }
}

impl HydrocastConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON from a reader.
    pub fn from_reader<R: Read>(reader: R) -> ConfigResult<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Validate every configured profile.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reservoirs.is_empty() {
            return Err(ConfigError::Empty("reservoirs"));
        }
        for profile in self.reservoirs.values() {
            profile.validate()?;
        }
        Ok(())
    }

    pub fn profile(&self, kind: ReservoirKind) -> ConfigResult<&ReservoirProfile> {
        self.reservoirs
            .get(&kind)
            .ok_or_else(|| ConfigError::MissingReservoir(kind.to_string()))
    }

    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
