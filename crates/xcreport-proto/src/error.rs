//! Error types for xcreport.

use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Record shape error: {0}")]
    Shape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
