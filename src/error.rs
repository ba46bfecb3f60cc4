//! Error taxonomy for model construction, sizing runs, and exports.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced to callers of the sizing engine.
///
/// Lower-level pure functions (SOC update, slot simulation) never fail on a
/// validated [`ModelConfig`](crate::sim::types::ModelConfig); only
/// construction-time checks and I/O produce these.
#[derive(Debug, Error)]
pub enum SizingError {
    /// A model parameter is outside its valid domain.
    #[error("invalid parameter `{field}`: {message}")]
    InvalidParameter {
        /// Dotted field path (e.g., `"availability.probability"`).
        field: String,
        /// Human-readable constraint description.
        message: String,
    },

    /// A portfolio of zero assets was requested where a size is required.
    #[error("portfolio must contain at least one asset")]
    EmptyPortfolio,

    /// The capacity search range or confidence target is malformed.
    #[error("invalid search: {0}")]
    InvalidSearch(String),

    /// The Monte Carlo estimator was asked to run zero trials.
    #[error("trial count must be > 0")]
    InvalidTrials,

    /// Scenario file or preset could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SizingError {
    /// Shorthand for an [`SizingError::InvalidParameter`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SizingError>;
