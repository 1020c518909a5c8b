//! Error types for omdinv-inventory

use omdinv_transport::TransportError;
use thiserror::Error;

/// The backend reply could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A delimited line had the wrong number of fields
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        /// 1-based line number
        line: usize,
        /// Fields the query asked for
        expected: usize,
        /// Fields present
        found: usize,
    },

    /// Structured reply is not valid JSON
    #[error("invalid JSON response: {0}")]
    InvalidJson(String),

    /// A structured row has the wrong shape
    #[error("row {row}: {reason}")]
    InvalidRow {
        /// 0-based row index
        row: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// Errors that can occur while producing an inventory
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Query could not be delivered or answered
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Reply could not be decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Output document could not be serialized
    #[error("render error: {0}")]
    Render(#[from] serde_json::Error),
}

impl InventoryError {
    /// Check if error is transient
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Transport(e) if e.is_retryable())
    }
}
