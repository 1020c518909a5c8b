//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};
use omdinv_inventory::InventoryKey;

use crate::config::Encoding;

/// Livestatus dynamic inventory for Ansible
#[derive(Parser, Debug)]
#[command(name = "omdinv", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub action: ActionArgs,

    /// Key hosts by IP address instead of by name
    #[arg(long, conflicts_with = "by_name")]
    pub by_ip: bool,

    /// Key hosts by name, overriding `by_ip` from the config file
    #[arg(long)]
    pub by_name: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Query encoding (json includes custom variables)
    #[arg(long, value_enum)]
    pub encoding: Option<Encoding>,

    /// Configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Inventory key from the flags, falling back to the config value
    #[must_use]
    pub fn inventory_key(&self, config_by_ip: bool) -> InventoryKey {
        let by_ip = if self.by_ip {
            true
        } else if self.by_name {
            false
        } else {
            config_by_ip
        };

        if by_ip {
            InventoryKey::Address
        } else {
            InventoryKey::Name
        }
    }
}

/// Output formats
#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct ActionArgs {
    /// Return the full inventory as JSON (default action)
    #[arg(long)]
    pub list: bool,

    /// Return hostvars for HOST as JSON
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Print the inventory in static file format
    #[arg(long = "static")]
    pub static_inventory: bool,
}

/// Connection options
#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct ConnectionArgs {
    /// Livestatus socket path or host:port; defaults to
    /// $OMD_LIVESTATUS_SOCKET or $OMD_ROOT/tmp/run/live
    #[arg(long, value_name = "LOCATION")]
    pub socket: Option<String>,

    /// Reach the socket via SSH: [user@]host[:path], path defaults to ./tmp/run/live
    #[arg(long, value_name = "LOCATION")]
    pub ssh: Option<String>,
}

/// What to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Host(String),
    Static,
}

impl ActionArgs {
    /// Selected action, `--list` when none is given
    #[must_use]
    pub fn action(&self) -> Action {
        if let Some(host) = &self.host {
            Action::Host(host.clone())
        } else if self.static_inventory {
            Action::Static
        } else {
            Action::List
        }
    }
}
