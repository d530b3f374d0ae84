//! Error types for the load prediction core

use thiserror::Error;

/// Errors raised while loading artifacts, building features or scoring
#[derive(Error, Debug)]
pub enum LoadCoreError {
    /// Artifact file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact or payload is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact parsed but violates a structural rule
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    /// Model and column schema disagree on the feature layout
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Prediction request rejected before feature construction
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model failed to produce a usable score for the batch
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl LoadCoreError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, LoadCoreError::InvalidRequest(_))
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, LoadCoreError>;
