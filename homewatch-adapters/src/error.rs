//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when collecting state from adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse command output or a response.
    #[error("Failed to parse output: {0}")]
    Parse(String),

    /// An external command exited unsuccessfully.
    #[error("Command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    /// The backing service (docker daemon, /proc) is not available.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Timeout waiting for a command or response.
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            AdapterError::Unavailable(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
