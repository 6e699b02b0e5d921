//! Error types for the spindl library.

use thiserror::Error;

/// Errors that can occur while talking to the download server.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during terminal or preference-file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel-level failure (closed stream, missed response).
    #[error("channel error: {0}")]
    Channel(String),
}

/// A specialized `Result` type for spindl operations.
pub type Result<T> = std::result::Result<T, Error>;
