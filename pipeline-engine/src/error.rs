//! FILENAME: pipeline-engine/src/error.rs

use thiserror::Error;

/// Failures at the configuration and slot boundary. Pipeline stages
/// themselves never fail.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Slot not found: {0}")]
    UnknownSlot(String),

    #[error("Slot already exists: {0}")]
    DuplicateSlot(String),
}
