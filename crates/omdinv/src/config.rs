//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use omdinv_inventory::ResponseEncoding;
use omdinv_transport::ssh::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REMOTE_HELPER, DEFAULT_SSH_BINARY,
};
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "OMDINV_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,
    /// How to reach Livestatus
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// How to build and print the inventory
    #[serde(default)]
    pub inventory: InventoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            connection: ConnectionConfig::default(),
            inventory: InventoryConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Socket path or `host:port`
    pub socket: Option<String>,
    /// SSH tunnel descriptor `[user@]host[:path]`
    pub ssh: Option<String>,
    /// ssh client binary
    #[serde(default = "default_ssh_binary")]
    pub ssh_binary: String,
    /// Helper run on the monitoring host to reach its socket
    #[serde(default = "default_remote_helper")]
    pub remote_helper: String,
    /// ssh `ConnectTimeout` in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Bound on the whole ssh session in seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            socket: None,
            ssh: None,
            ssh_binary: default_ssh_binary(),
            remote_helper: default_remote_helper(),
            connect_timeout_secs: default_connect_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl ConnectionConfig {
    /// ssh `ConnectTimeout`
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Bound on the whole ssh session
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn default_ssh_binary() -> String {
    DEFAULT_SSH_BINARY.to_string()
}

fn default_remote_helper() -> String {
    DEFAULT_REMOTE_HELPER.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT.as_secs()
}

/// Wire encoding of the host query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// `OutputFormat: json`, includes custom variables
    #[default]
    Json,
    /// Livestatus default CSV, no custom variables
    Csv,
}

impl From<Encoding> for ResponseEncoding {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Json => ResponseEncoding::Structured,
            Encoding::Csv => ResponseEncoding::Delimited,
        }
    }
}

/// Inventory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Key hosts by address instead of name
    #[serde(default)]
    pub by_ip: bool,
    /// Query encoding
    #[serde(default)]
    pub encoding: Encoding,
    /// Sort JSON keys
    #[serde(default = "default_true")]
    pub sort_keys: bool,
    /// Indent JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            by_ip: false,
            encoding: Encoding::default(),
            sort_keys: true,
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("cannot read config {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("invalid config {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit path, `$OMDINV_CONFIG`, or the default paths
    ///
    /// No file at any default path means defaults.
    ///
    /// # Errors
    /// Returns error if a file was named but cannot be loaded
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(&PathBuf::from(path));
        }

        for path in default_paths() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Config::default())
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("omdinv.toml"),
        PathBuf::from("/etc/omdinv/omdinv.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("omdinv/omdinv.toml"));
    }
    paths
}
