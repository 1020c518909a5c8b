//! Livestatus over an SSH tunnel
//!
//! Spawns the system ssh client in batch mode and runs a helper (`unixcat`,
//! shipped with Livestatus) on the monitoring host. The query goes to the
//! session's stdin and the reply comes back on stdout. Authentication is left
//! to the ssh client (agent, config, keys); no password prompt is ever shown.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::error::TransportError;
use crate::target::TunnelTarget;
use crate::traits::Transport;

/// Default ssh client binary
pub const DEFAULT_SSH_BINARY: &str = "ssh";

/// Default remote helper that relays stdin/stdout to a Unix socket
pub const DEFAULT_REMOTE_HELPER: &str = "unixcat";

/// Default ssh `ConnectTimeout`
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on the whole tunnel session
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Characters that pass through a POSIX shell unquoted
fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "/._-+:@,=%".contains(c)
}

/// Quote a word for the remote shell
///
/// Plain words are left alone; anything else is wrapped in single quotes
/// with embedded quotes written as `'\''`.
fn shell_quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_shell_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// SSH tunnel transport
#[derive(Debug, Clone)]
pub struct SshTunnelTransport {
    target: TunnelTarget,
    ssh_binary: String,
    remote_helper: String,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshTunnelTransport {
    /// Create a tunnel transport with default settings
    #[must_use]
    pub fn new(target: TunnelTarget) -> Self {
        Self {
            target,
            ssh_binary: DEFAULT_SSH_BINARY.to_string(),
            remote_helper: DEFAULT_REMOTE_HELPER.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Tunnel target
    #[must_use]
    pub fn target(&self) -> &TunnelTarget {
        &self.target
    }

    /// Arguments passed to the ssh client
    #[must_use]
    pub fn ssh_args(&self) -> Vec<String> {
        vec![
            self.target.destination(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            // The remote side runs this through a shell
            format!("{} {}", self.remote_helper, shell_quote(&self.target.socket_path)),
        ]
    }

    /// Spawn the session, feed it the query and collect its output
    async fn execute(&self, query: &str) -> Result<String, TransportError> {
        let start = Instant::now();
        let args = self.ssh_args();

        debug!(binary = %self.ssh_binary, args = ?args, "spawning ssh session");

        let mut child = Command::new(&self.ssh_binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::SpawnError(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(query.as_bytes()).await {
                // The session may exit before reading; its status tells why
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("ssh session closed stdin early");
                }
                Err(e) => return Err(TransportError::IoError(e.to_string())),
                Ok(()) => {}
            }
            // Dropping stdin closes it, which ends the query
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TransportError::IoError(e.to_string()))?;

        let status = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        debug!(
            status = status,
            bytes = output.stdout.len(),
            duration = ?start.elapsed(),
            "ssh session completed"
        );

        if !output.status.success() {
            error!(
                destination = %self.target.destination(),
                status = status,
                stderr = %stderr,
                "ssh session failed"
            );
            return Err(TransportError::CommandFailed { status, stderr });
        }

        TransportError::response_text(output.stdout)
    }
}

#[async_trait]
impl Transport for SshTunnelTransport {
    #[instrument(skip(self, query), fields(target = %self.target))]
    async fn send_query(&self, query: &str) -> Result<String, TransportError> {
        let start = Instant::now();

        match timeout(self.command_timeout, self.execute(query)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    timeout = ?self.command_timeout,
                    elapsed = ?start.elapsed(),
                    "ssh session timed out"
                );
                Err(TransportError::Timeout {
                    timeout: self.command_timeout,
                })
            }
        }
    }

    fn transport_type(&self) -> &'static str {
        "ssh"
    }
}

/// Builder for `SshTunnelTransport`
pub struct SshTunnelTransportBuilder {
    transport: SshTunnelTransport,
}

impl SshTunnelTransportBuilder {
    /// Create builder for a parsed target
    #[must_use]
    pub fn new(target: TunnelTarget) -> Self {
        Self {
            transport: SshTunnelTransport::new(target),
        }
    }

    /// Parse a `[user@]host[:path]` descriptor
    ///
    /// # Errors
    /// Returns `TransportError::InvalidTarget` if the descriptor is malformed
    pub fn from_descriptor(descriptor: &str) -> Result<Self, TransportError> {
        Ok(Self::new(descriptor.parse()?))
    }

    /// Use a different ssh client binary
    #[must_use]
    pub fn with_ssh_binary(mut self, binary: impl Into<String>) -> Self {
        self.transport.ssh_binary = binary.into();
        self
    }

    /// Use a different remote helper
    #[must_use]
    pub fn with_remote_helper(mut self, helper: impl Into<String>) -> Self {
        self.transport.remote_helper = helper.into();
        self
    }

    /// Set ssh `ConnectTimeout`
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.transport.connect_timeout = connect_timeout;
        self
    }

    /// Set the bound on the whole session
    #[must_use]
    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.transport.command_timeout = command_timeout;
        self
    }

    /// Build the transport
    #[must_use]
    pub fn build(self) -> SshTunnelTransport {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    // `sh <script> <args...>` stands in for `ssh <host> <args...>`: the
    // script path is passed as the tunnel host and the ssh options become
    // positional parameters.
    fn fake_tunnel(dir: &Path, script: &str) -> SshTunnelTransport {
        let path = dir.join("fake-ssh.sh");
        std::fs::write(&path, script).unwrap();

        SshTunnelTransportBuilder::new(TunnelTarget::new(path.display().to_string()))
            .with_ssh_binary("sh")
            .build()
    }

    #[test]
    fn test_ssh_args() {
        let target: TunnelTarget = "site@monitor:/omd/sites/site/tmp/run/live".parse().unwrap();
        let transport = SshTunnelTransportBuilder::new(target)
            .with_connect_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(
            transport.ssh_args(),
            vec![
                "site@monitor",
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=5",
                "unixcat /omd/sites/site/tmp/run/live",
            ]
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("./tmp/run/live"), "./tmp/run/live");
        assert_eq!(shell_quote("/omd/sites/my site/live"), "'/omd/sites/my site/live'");
        assert_eq!(shell_quote("/tmp/$(id)"), "'/tmp/$(id)'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_socket_path_is_quoted() {
        let target = TunnelTarget::new("monitor").with_socket_path("/tmp/live; rm -rf ~");
        let transport = SshTunnelTransport::new(target);

        assert_eq!(
            transport.ssh_args().last().unwrap(),
            "unixcat '/tmp/live; rm -rf ~'"
        );
    }

    #[test]
    fn test_builder_from_descriptor() {
        let transport = SshTunnelTransportBuilder::from_descriptor("monitor")
            .unwrap()
            .with_remote_helper("/usr/bin/unixcat")
            .build();

        assert_eq!(transport.target().socket_path, "./tmp/run/live");
        assert_eq!(
            transport.ssh_args().last().unwrap(),
            "/usr/bin/unixcat ./tmp/run/live"
        );
        assert!(SshTunnelTransportBuilder::from_descriptor("@").is_err());
    }

    #[tokio::test]
    async fn test_query_is_piped_through() {
        let dir = tempfile::tempdir().unwrap();
        let transport = fake_tunnel(dir.path(), "cat\n");

        let response = transport.send_query("GET hosts\n\n").await.unwrap();

        assert_eq!(response, "GET hosts\n\n");
    }

    #[tokio::test]
    async fn test_remote_command_receives_helper_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let transport = fake_tunnel(dir.path(), "cat > /dev/null\necho \"$5\"\n");

        let response = transport.send_query("GET hosts\n\n").await.unwrap();

        assert_eq!(response.trim(), "unixcat ./tmp/run/live");
    }

    #[tokio::test]
    async fn test_remote_shell_sees_literal_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake-ssh.sh");
        // Split the remote command the way a login shell would
        std::fs::write(
            &path,
            "cat > /dev/null\neval \"set -- $5\"\nprintf '%s\\n' \"$#\" \"$2\"\n",
        )
        .unwrap();
        let target = TunnelTarget::new(path.display().to_string())
            .with_socket_path("/omd/sites/my site/$(touch pwned)/live");
        let transport = SshTunnelTransportBuilder::new(target)
            .with_ssh_binary("sh")
            .build();

        let response = transport.send_query("GET hosts\n\n").await.unwrap();

        assert_eq!(response, "2\n/omd/sites/my site/$(touch pwned)/live\n");
        assert!(!Path::new("pwned").exists());
    }

    #[tokio::test]
    async fn test_invalid_utf8_output() {
        let dir = tempfile::tempdir().unwrap();
        // \374 is a Latin-1 u-umlaut
        let transport = fake_tunnel(
            dir.path(),
            "cat > /dev/null\nprintf '10.0.0.1;web1;B\\374ro;prod\\n'\n",
        );

        let result = transport.send_query("GET hosts\n\n").await;

        assert!(matches!(result, Err(TransportError::InvalidEncoding(_))));
    }

    #[tokio::test]
    async fn test_nonzero_exit_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let transport = fake_tunnel(
            dir.path(),
            "echo 'Permission denied (publickey).' >&2\nexit 255\n",
        );

        let result = transport.send_query("GET hosts\n\n").await;

        match result {
            Err(TransportError::CommandFailed { status, stderr }) => {
                assert_eq!(status, 255);
                assert_eq!(stderr, "Permission denied (publickey).");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_session_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake-ssh.sh");
        std::fs::write(&path, "exec sleep 5\n").unwrap();
        let target = TunnelTarget::new(path.display().to_string());
        let transport = SshTunnelTransportBuilder::new(target)
            .with_ssh_binary("sh")
            .with_command_timeout(Duration::from_millis(100))
            .build();

        let result = transport.send_query("GET hosts\n\n").await;

        assert!(matches!(result, Err(TransportError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let transport = SshTunnelTransportBuilder::new(TunnelTarget::new("monitor"))
            .with_ssh_binary("/nonexistent/ssh")
            .build();

        let result = transport.send_query("GET hosts\n\n").await;

        assert!(matches!(result, Err(TransportError::SpawnError(_))));
    }
}
