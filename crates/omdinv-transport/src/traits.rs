//! Transport trait

use async_trait::async_trait;

use crate::error::TransportError;

/// A channel that delivers one query to the backend and returns its reply
///
/// Every implementation returns the complete raw response text, so callers
/// only pick a variant and never care which one they hold afterwards.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `query` and read the response until the backend is done
    ///
    /// # Errors
    /// Returns `TransportError` if the channel cannot be opened, the write or
    /// read fails, or the tunnel command exits non-zero.
    async fn send_query(&self, query: &str) -> Result<String, TransportError>;

    /// Short name used in logs
    fn transport_type(&self) -> &'static str;
}
