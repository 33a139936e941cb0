// Centralized configuration for the cathode model and the cycling protocol

use serde::{Deserialize, Serialize};

use crate::cycler::Phase;
use crate::error::ConfigError;

// ====================
// Cathode Parameters
// ====================
/// Number of cells across the cathode; also sets the diffusion length scale.
pub const CATHODE_WIDTH: usize = 1000;

// ====================
// Protocol Setpoints
// ====================
pub const CHARGE_CC: f64 = 15.0; // Charge per timestep during constant-current phases
pub const CHARGE_CV: f64 = 4.0; // Potential held during constant-voltage charge
pub const DISCHARGE_CV: f64 = 0.0; // Potential held during constant-voltage discharge
/// Current magnitude below which a constant-voltage phase counts as finished
pub const ZERO_CURRENT_THRESHOLD: f64 = 1.0;
pub const REST_TIMESTEPS: u64 = 20;
pub const DRIVER_POTENTIAL_INIT: f64 = 0.0;

// ====================
// Run Parameters
// ====================
pub const NUM_TIMESTEPS: u64 = 750;
/// Record every N-th charge curve in the history
pub const CURVE_INTERVAL: u64 = 1;
/// Log a progress line every N timesteps
pub const LOG_INTERVAL: u64 = 50;
pub const OUTPUT_DIR: &str = "output";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclerConfig {
    pub cathode_width: usize,
    pub charge_cc: f64,
    pub charge_cv: f64,
    pub discharge_cv: f64,
    pub zero_current_threshold: f64,
    pub rest_timesteps: u64,
    pub initial_driver_potential: f64,
    /// Phase the program starts in
    pub initial_phase: Phase,
    /// Restart the per-phase timestep count on every phase entry. Off by default: the count
    /// then runs for the whole program and the rest phase can end as soon as it begins.
    pub reset_phase_timesteps: bool,
}

impl Default for CyclerConfig {
    fn default() -> Self {
        Self {
            cathode_width: CATHODE_WIDTH,
            charge_cc: CHARGE_CC,
            charge_cv: CHARGE_CV,
            discharge_cv: DISCHARGE_CV,
            zero_current_threshold: ZERO_CURRENT_THRESHOLD,
            rest_timesteps: REST_TIMESTEPS,
            initial_driver_potential: DRIVER_POTENTIAL_INIT,
            initial_phase: Phase::ChargeCc,
            reset_phase_timesteps: false,
        }
    }
}

impl CyclerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cathode_width < 2 {
            return Err(ConfigError::Invalid(
                "cathode_width must be at least 2 (the potential is read at cell 1)".into(),
            ));
        }

        let setpoints = [
            ("charge_cc", self.charge_cc),
            ("charge_cv", self.charge_cv),
            ("discharge_cv", self.discharge_cv),
            ("zero_current_threshold", self.zero_current_threshold),
            ("initial_driver_potential", self.initial_driver_potential),
        ];
        for (name, value) in setpoints {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }

        if self.charge_cc <= 0.0 {
            return Err(ConfigError::Invalid("charge_cc must be positive".into()));
        }
        if self.zero_current_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "zero_current_threshold must not be negative".into(),
            ));
        }
        // Overlapping potentials would let the two CC phases hand off to each other forever.
        if self.charge_cv <= self.discharge_cv {
            return Err(ConfigError::Invalid(format!(
                "charge_cv ({}) must be above discharge_cv ({})",
                self.charge_cv, self.discharge_cv
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ConfigError::Invalid(format!("Unknown export format: {s}"))),
        }
    }
}

/// Settings for a headless run; none of these affect the simulation itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub num_timesteps: u64,
    pub curve_interval: u64,
    pub log_interval: u64,
    pub output_dir: String,
    pub export_format: ExportFormat,
    /// Gzip every exported file
    pub compress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_timesteps: NUM_TIMESTEPS,
            curve_interval: CURVE_INTERVAL,
            log_interval: LOG_INTERVAL,
            output_dir: OUTPUT_DIR.to_string(),
            export_format: ExportFormat::Csv,
            compress: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.curve_interval == 0 {
            return Err(ConfigError::Invalid("curve_interval must be at least 1".into()));
        }
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".into()));
        }
        Ok(())
    }
}
