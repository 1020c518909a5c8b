//! Error types for omdinv-transport

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the monitoring backend
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Socket path does not exist
    #[error("socket not found: {0}")]
    SocketNotFound(String),

    /// Failed to connect to the socket or remote host
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Tunnel command exited non-zero
    #[error("tunnel command failed: {status} - {stderr}")]
    CommandFailed {
        /// Exit status code
        status: i32,
        /// Stderr output of the remote session
        stderr: String,
    },

    /// Tunnel command timed out
    #[error("tunnel command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error while writing the query or reading the response
    #[error("I/O error: {0}")]
    IoError(String),

    /// Response is not valid UTF-8
    #[error("response is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    /// Malformed socket location or tunnel descriptor
    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

impl TransportError {
    /// Check if error is transient
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailed(_) | TransportError::Timeout { .. }
        )
    }

    /// Decode a raw response, refusing invalid UTF-8
    pub(crate) fn response_text(bytes: Vec<u8>) -> Result<String, Self> {
        String::from_utf8(bytes).map_err(|e| TransportError::InvalidEncoding(e.to_string()))
    }

    pub(crate) fn from_connect(target: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => TransportError::SocketNotFound(target.to_string()),
            _ => TransportError::ConnectionFailed(format!("{target}: {err}")),
        }
    }
}
