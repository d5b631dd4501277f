//! Error taxonomy for the optimization engine.

use crate::model::Algorithm;
use thiserror::Error;

/// Errors surfaced by validation, generation, orchestration and learning.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// The player pool cannot support any lineup. Nothing was generated.
    #[error("player pool validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("optimizer not initialized: {algorithm} generator has no player pool")]
    NotInitialized { algorithm: Algorithm },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("{algorithm} failed during {stage}: {message}")]
    AlgorithmFailure {
        algorithm: Algorithm,
        stage: String,
        message: String,
    },

    /// User-initiated stop observed at a loop boundary.
    #[error("optimization cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("neighbor generation failed for {move_kind}: {reason}")]
    NeighborGeneration { move_kind: String, reason: String },

    #[error("invalid {component} configuration: {message}")]
    InvalidConfig { component: String, message: String },

    #[error("storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl OptimizerError {
    /// True for a cooperative cancellation, as opposed to a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OptimizerError::Cancelled { .. })
    }

    pub(crate) fn invalid_config(component: &str, message: String) -> Self {
        OptimizerError::InvalidConfig {
            component: component.to_string(),
            message,
        }
    }

    pub(crate) fn algorithm_failure(algorithm: Algorithm, stage: &str, message: impl Into<String>) -> Self {
        OptimizerError::AlgorithmFailure {
            algorithm,
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
