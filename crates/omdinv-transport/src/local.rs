//! Socket transports using `tokio::net`
//!
//! Livestatus answers once the query side of the connection is shut down and
//! closes the connection when the reply is complete, so the whole exchange is
//! write, half-close, read to EOF.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tracing::{debug, instrument};

use crate::error::TransportError;
use crate::target::SocketLocation;
use crate::traits::Transport;

/// Run one query over an open stream
async fn exchange<S>(mut stream: S, query: &str) -> Result<String, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let start = Instant::now();

    stream
        .write_all(query.as_bytes())
        .await
        .map_err(|e| TransportError::IoError(e.to_string()))?;

    // Half-close: the backend starts answering once it sees EOF on its read side
    stream
        .shutdown()
        .await
        .map_err(|e| TransportError::IoError(e.to_string()))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .map_err(|e| TransportError::IoError(e.to_string()))?;

    debug!(
        bytes = response.len(),
        duration = ?start.elapsed(),
        "response received"
    );

    TransportError::response_text(response)
}

/// Build the socket transport matching a location
#[must_use]
pub fn socket_transport(location: &SocketLocation) -> Arc<dyn Transport> {
    match location {
        SocketLocation::Unix(path) => Arc::new(UnixSocketTransport::new(path)),
        SocketLocation::Tcp { host, port } => Arc::new(TcpTransport::new(host.clone(), *port)),
    }
}

/// Local Unix socket transport
#[derive(Debug, Clone)]
pub struct UnixSocketTransport {
    path: PathBuf,
}

impl UnixSocketTransport {
    /// Create a transport for the socket at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Socket path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    #[instrument(skip(self, query), fields(path = %self.path.display()))]
    async fn send_query(&self, query: &str) -> Result<String, TransportError> {
        debug!("connecting to unix socket");

        let stream = UnixStream::connect(&self.path)
            .await
            .map_err(|e| TransportError::from_connect(&self.path.display().to_string(), &e))?;

        exchange(stream, query).await
    }

    fn transport_type(&self) -> &'static str {
        "unix"
    }
}

/// TCP transport for a Livestatus instance exposed on a port
#[derive(Debug, Clone)]
pub struct TcpTransport {
    host: String,
    port: u16,
}

impl TcpTransport {
    /// Create a transport for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    #[instrument(skip(self, query), fields(host = %self.host, port = self.port))]
    async fn send_query(&self, query: &str) -> Result<String, TransportError> {
        debug!("connecting to tcp socket");

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("{}:{}: {e}", self.host, self.port))
            })?;

        exchange(stream, query).await
    }

    fn transport_type(&self) -> &'static str {
        "tcp"
    }
}
