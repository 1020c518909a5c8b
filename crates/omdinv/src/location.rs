//! Where to find Livestatus
//!
//! Precedence: command line, config file, `$OMD_LIVESTATUS_SOCKET`, then the
//! socket under `$OMD_ROOT`.

use std::sync::Arc;

use eyre::{Result, bail};
use omdinv_transport::target::SITE_SOCKET_PATH;
use omdinv_transport::{
    SocketLocation, SshTunnelTransportBuilder, Transport, TunnelTarget, socket_transport,
};

use crate::cli::ConnectionArgs;
use crate::config::ConnectionConfig;

/// Socket path environment variable
pub const SOCKET_ENV: &str = "OMD_LIVESTATUS_SOCKET";

/// OMD site root environment variable
pub const OMD_ROOT_ENV: &str = "OMD_ROOT";

/// Environment relevant to socket discovery
#[derive(Debug, Clone, Default)]
pub struct SocketEnv {
    /// `$OMD_LIVESTATUS_SOCKET`
    pub livestatus_socket: Option<String>,
    /// `$OMD_ROOT`
    pub omd_root: Option<String>,
}

impl SocketEnv {
    /// Read from the process environment
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            livestatus_socket: std::env::var(SOCKET_ENV).ok().filter(|v| !v.is_empty()),
            omd_root: std::env::var(OMD_ROOT_ENV).ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Resolved connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Socket(SocketLocation),
    Ssh(TunnelTarget),
}

impl Connection {
    /// Build the transport for this connection
    #[must_use]
    pub fn transport(&self, config: &ConnectionConfig) -> Arc<dyn Transport> {
        match self {
            Connection::Socket(location) => socket_transport(location),
            Connection::Ssh(target) => Arc::new(
                SshTunnelTransportBuilder::new(target.clone())
                    .with_ssh_binary(&config.ssh_binary)
                    .with_remote_helper(&config.remote_helper)
                    .with_connect_timeout(config.connect_timeout())
                    .with_command_timeout(config.command_timeout())
                    .build(),
            ),
        }
    }
}

/// Pick the connection from flags, config and environment
///
/// # Errors
/// Returns error if no socket location can be determined or a location is
/// malformed
pub fn resolve(
    args: &ConnectionArgs,
    config: &ConnectionConfig,
    env: &SocketEnv,
) -> Result<Connection> {
    if let Some(ssh) = &args.ssh {
        return Ok(Connection::Ssh(ssh.parse()?));
    }
    if let Some(socket) = &args.socket {
        return Ok(Connection::Socket(socket.parse()?));
    }

    match (&config.ssh, &config.socket) {
        (Some(_), Some(_)) => bail!("config sets both connection.ssh and connection.socket"),
        (Some(ssh), None) => return Ok(Connection::Ssh(ssh.parse()?)),
        (None, Some(socket)) => return Ok(Connection::Socket(socket.parse()?)),
        (None, None) => {}
    }

    Ok(Connection::Socket(resolve_socket(env)?.parse()?))
}

/// Socket location from the environment alone
///
/// # Errors
/// Returns error if neither variable is set
pub fn resolve_socket(env: &SocketEnv) -> Result<String> {
    if let Some(socket) = &env.livestatus_socket {
        return Ok(socket.clone());
    }
    if let Some(root) = &env.omd_root {
        return Ok(format!("{}/{SITE_SOCKET_PATH}", root.trim_end_matches('/')));
    }

    bail!(
        "Unable to determine location of Livestatus socket. \
         Try setting {SOCKET_ENV} environment variable."
    )
}
