// init_config.rs
// Handles loading and parsing the run configuration from cycler_config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::{CyclerConfig, RunConfig};
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "cycler_config.toml";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InitConfig {
    /// Cathode and protocol parameters
    pub cycler: CyclerConfig,
    /// Run length, logging and export settings
    pub run: RunConfig,
}

impl InitConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: InitConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `cycler_config.toml` from the working directory, falling back to the built-in
    /// defaults when the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::load_from_file(DEFAULT_CONFIG_FILE)
        } else {
            log::info!("{DEFAULT_CONFIG_FILE} not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cycler.validate()?;
        self.run.validate()
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
