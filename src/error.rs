use std::io;
use thiserror::Error;

/// Custom error type for the vigil engine.
///
/// Collector strategies report failures through these variants; none of them
/// ever escapes a collector boundary. A snapshot is always structurally
/// complete, with sentinel values standing in for failed fields.
#[derive(Error, Debug)]
pub enum VigilError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for the vigil engine
pub type Result<T> = std::result::Result<T, VigilError>;

impl VigilError {
    /// Create a source-unavailable error
    pub fn source_unavailable<S: Into<String>>(msg: S) -> Self {
        VigilError::SourceUnavailable(msg.into())
    }

    /// Create a parse-failure error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        VigilError::Parse(msg.into())
    }

    /// Create a permission-denied error
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        VigilError::PermissionDenied(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        VigilError::Timeout(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        VigilError::Config(msg.into())
    }
}
