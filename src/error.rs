// error.rs
// Error types for the diffusion model, driver solver, cycling program and the outer layers.

use std::io;

use thiserror::Error;

use crate::cycler::Phase;

/// Failures of the single-shot driver potential solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Both sample points produced the same observation, so no line can be fitted through them.
    #[error("division by zero: driving potential has no effect on the observed value ({observed})")]
    DivisionByZero { observed: f64 },

    /// The charge curve has no boundary sample to start from.
    #[error("charge curve is empty")]
    EmptyCurve,
}

/// Failures of the cycling program. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CyclerError {
    #[error("unrecognized phase '{0}'")]
    UnrecognizedPhase(String),

    /// Phase exits kept firing within a single call; the thresholds overlap.
    #[error("phase transitions did not settle within one timestep (stuck at {phase})")]
    TransitionLoop { phase: Phase },

    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
