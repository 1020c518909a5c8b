//! omdinv-transport: byte-stream channels to a Livestatus backend
//!
//! Provides the [`Transport`](traits::Transport) trait and its implementations:
//! a local Unix socket, a TCP socket, and an SSH tunnel that pipes the query
//! through a helper binary on the monitoring host.

pub mod error;
pub mod local;
pub mod ssh;
pub mod target;
pub mod traits;

pub use error::TransportError;
pub use local::{TcpTransport, UnixSocketTransport, socket_transport};
pub use ssh::{SshTunnelTransport, SshTunnelTransportBuilder};
pub use target::{SocketLocation, TunnelTarget};
pub use traits::Transport;
