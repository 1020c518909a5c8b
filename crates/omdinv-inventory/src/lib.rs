//! omdinv-inventory: Livestatus hosts as an orchestrator inventory
//!
//! Queries the `hosts` table, groups hosts by their host groups and renders
//! the result as a dynamic inventory document, a single host's variables, or
//! a static inventory file.

pub mod builder;
pub mod client;
pub mod codec;
pub mod error;
pub mod query;
pub mod render;
pub mod types;

pub use builder::{InventoryBuilder, sanitize_group_name};
pub use client::LivestatusClient;
pub use error::{InventoryError, ProtocolError};
pub use query::{Query, ResponseEncoding};
pub use render::{RenderOptions, render_host, render_list, render_static};
pub use types::{HostRecord, HostVars, Inventory, InventoryKey};
