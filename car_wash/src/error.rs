//! Error types for the car wash model

use thiserror::Error;

/// Raised before any tick runs when the parameters cannot describe a wash
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },
}

impl SimulationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SimulationError::InvalidParameters {
            reason: reason.into(),
        }
    }
}

/// The mean of zero observations is undefined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Mean requested from an empty accumulator")]
pub struct EmptyAccumulator;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error parsing TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown gate policy '{0}' (expected 'closed-gate' or 'open-gate')")]
    UnknownPolicy(String),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Error writing output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error serializing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error writing CSV: {0}")]
    Csv(#[from] csv::Error),
}
