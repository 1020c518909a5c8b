//! Livestatus client for inventory collection

use std::sync::Arc;

use omdinv_transport::Transport;
use tracing::{debug, info, instrument};

use crate::codec::decode_hosts;
use crate::error::InventoryError;
use crate::query::{Query, ResponseEncoding, queries};
use crate::types::{HostRecord, Inventory, InventoryKey};

/// Livestatus client
///
/// Sends the host query over a transport and decodes the reply. One client
/// serves one invocation; nothing is cached.
pub struct LivestatusClient {
    /// Channel to the backend
    transport: Arc<dyn Transport>,
    /// Encoding requested and decoded
    encoding: ResponseEncoding,
}

impl LivestatusClient {
    /// Create a client using the structured encoding
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            encoding: ResponseEncoding::default(),
        }
    }

    /// Set response encoding
    #[must_use]
    pub fn with_encoding(mut self, encoding: ResponseEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Response encoding in use
    #[must_use]
    pub fn encoding(&self) -> ResponseEncoding {
        self.encoding
    }

    /// Send a query and return the raw reply
    ///
    /// # Errors
    /// Returns `InventoryError::Transport` if the query cannot be delivered
    #[instrument(skip(self, query), fields(transport = self.transport.transport_type()))]
    pub async fn query_raw(&self, query: &Query) -> Result<String, InventoryError> {
        let lql = query.build();
        debug!(query = %lql.trim_end(), "sending livestatus query");

        Ok(self.transport.send_query(&lql).await?)
    }

    /// Fetch all hosts
    ///
    /// # Errors
    /// Returns `InventoryError::Transport` if the query fails and
    /// `InventoryError::Protocol` if the reply cannot be decoded
    pub async fn fetch_hosts(&self) -> Result<Vec<HostRecord>, InventoryError> {
        let response = self.query_raw(&queries::hosts(self.encoding)).await?;
        let hosts = decode_hosts(&response, self.encoding)?;

        info!(hosts = hosts.len(), "fetched hosts from livestatus");
        Ok(hosts)
    }

    /// Fetch all hosts and build the inventory
    ///
    /// # Errors
    /// Same as [`LivestatusClient::fetch_hosts`]
    pub async fn fetch_inventory(&self, key: InventoryKey) -> Result<Inventory, InventoryError> {
        let hosts = self.fetch_hosts().await?;
        Ok(Inventory::from_hosts(&hosts, key))
    }
}
