//! Socket locations and tunnel descriptors

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Livestatus socket path relative to an OMD site root
pub const SITE_SOCKET_PATH: &str = "tmp/run/live";

/// Remote socket path used when a tunnel descriptor names none
///
/// SSH sessions start in the site user's home, which is the site root.
pub const DEFAULT_REMOTE_SOCKET_PATH: &str = "./tmp/run/live";

/// Where the local socket transport connects to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketLocation {
    /// Unix domain socket at a filesystem path
    Unix(PathBuf),
    /// TCP listener (`host:port`)
    Tcp {
        /// Host name or address
        host: String,
        /// Port
        port: u16,
    },
}

impl FromStr for SocketLocation {
    type Err = TransportError;

    /// `host:port` with a numeric port is TCP, anything else is a socket path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TransportError::InvalidTarget(
                "empty socket location".to_string(),
            ));
        }

        if let Some((host, port)) = s.rsplit_once(':')
            && !host.is_empty()
            && !host.contains('/')
            && let Ok(port) = port.parse::<u16>()
        {
            return Ok(SocketLocation::Tcp {
                host: host.to_string(),
                port,
            });
        }

        Ok(SocketLocation::Unix(PathBuf::from(s)))
    }
}

impl fmt::Display for SocketLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketLocation::Unix(path) => write!(f, "{}", path.display()),
            SocketLocation::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Remote tunnel descriptor: `[user@]host[:remote-path]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelTarget {
    /// Login user, if given
    pub user: Option<String>,
    /// Remote host
    pub host: String,
    /// Socket path on the remote host
    pub socket_path: String,
}

impl TunnelTarget {
    /// Create a target with the default remote socket path
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            user: None,
            host: host.into(),
            socket_path: DEFAULT_REMOTE_SOCKET_PATH.to_string(),
        }
    }

    /// Set login user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set remote socket path
    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Destination argument for the ssh client (`user@host` or `host`)
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

impl FromStr for TunnelTarget {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (destination, path) = match s.split_once(':') {
            Some((dest, path)) if !path.is_empty() => (dest, Some(path)),
            Some((dest, _)) => (dest, None),
            None => (s, None),
        };

        let (user, host) = match destination.split_once('@') {
            Some((user, host)) => (Some(user), host),
            None => (None, destination),
        };

        if host.is_empty() || user.is_some_and(str::is_empty) {
            return Err(TransportError::InvalidTarget(format!(
                "expected [user@]host[:path], got '{s}'"
            )));
        }

        let mut target = TunnelTarget::new(host);
        if let Some(user) = user {
            target = target.with_user(user);
        }
        if let Some(path) = path {
            target = target.with_socket_path(path);
        }
        Ok(target)
    }
}

impl fmt::Display for TunnelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.destination(), self.socket_path)
    }
}
