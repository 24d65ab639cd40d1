//! Error types for the packloc engine.

use thiserror::Error;

/// Result type for packloc operations.
pub type Result<T> = std::result::Result<T, PackLocError>;

/// Errors surfaced at the transport and settings seams.
///
/// `PackLoader` never propagates these to `ensure_loaded` callers; every I/O
/// failure is caught at the boundary where it occurs, logged, and degrades to
/// "no contribution". The type exists for transport/settings implementors and
/// for the explicit persistence operations (`share_labels` and friends).
#[derive(Debug, Error)]
pub enum PackLocError {
    /// Directory enumeration failed
    #[error("Browse failed for {dir}: {message}")]
    Browse { dir: String, message: String },

    /// Fetching a file failed
    #[error("Fetch failed for {path}: {message}")]
    Fetch { path: String, message: String },

    /// JSON parse error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings read/write failed
    #[error("Settings error: {0}")]
    Settings(String),

    /// A pack identifier could not be derived
    #[error("Invalid pack id: {0}")]
    InvalidPackId(String),
}
