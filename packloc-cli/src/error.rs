//! Error types for the light-index generator.

use thiserror::Error;

/// Result type for generator operations.
pub type CliResult<T> = Result<T, CliError>;

/// Generator error types.
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory scan error
    #[error("Failed to scan {path}: {message}")]
    Walk { path: String, message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
