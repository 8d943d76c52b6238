//! Error types for the daxbridge library.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::ExecutionFailure;

/// Main error type for daxbridge operations.
#[derive(Debug, Error)]
pub enum DaxBridgeError {
    /// The dataset schema could not be loaded. Fatal for the current request.
    #[error("Schema fetch failed: {0}")]
    SchemaUnavailable(String),

    /// A single model invocation failed (network, HTTP status, malformed reply).
    #[error("DAX generation failed: {0}")]
    Translation(String),

    /// The model call exceeded its configured timeout.
    #[error("DAX generation timed out: {0}")]
    TranslationTimeout(String),

    /// Every translation attempt raised an error.
    #[error("Failed to generate DAX after {attempts} attempts: {last_error}")]
    TranslationExhausted { attempts: u32, last_error: String },

    /// Execution was requested for an empty query.
    #[error("No DAX query to execute")]
    NoQuery,

    /// The engine rejected or failed to run the query.
    #[error("{0}")]
    Execution(ExecutionFailure),

    /// The caller abandoned the request while it was executing.
    #[error("Query execution cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DaxBridgeError {
    /// Whether the error came out of the model call (and may be retried by the caller).
    pub fn is_translation_failure(&self) -> bool {
        matches!(
            self,
            DaxBridgeError::Translation(_) | DaxBridgeError::TranslationTimeout(_)
        )
    }
}

impl From<ExecutionFailure> for DaxBridgeError {
    fn from(failure: ExecutionFailure) -> Self {
        DaxBridgeError::Execution(failure)
    }
}

/// Result type alias for daxbridge operations.
pub type Result<T> = std::result::Result<T, DaxBridgeError>;
