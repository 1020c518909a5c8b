//! Inventory type definitions

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// ============================================================================
// Backend rows
// ============================================================================

/// One monitored host as reported by Livestatus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Primary network address (may be empty or shared with other hosts)
    pub address: String,
    /// Canonical host name, unique within the backend
    pub name: String,
    /// Display label
    pub alias: String,
    /// Host group memberships in backend order
    #[serde(default)]
    pub groups: Vec<String>,
    /// Host custom variables (empty when the encoding cannot carry them)
    #[serde(default)]
    pub custom_variables: BTreeMap<String, String>,
}

impl HostRecord {
    /// Create a record without groups or custom variables
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            alias: alias.into(),
            ..Self::default()
        }
    }

    /// Set group memberships
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Add a custom variable
    #[must_use]
    pub fn with_custom_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.custom_variables.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Reserved top-level key holding per-host variables
pub const META_KEY: &str = "_meta";

/// Key under [`META_KEY`] holding the host variable maps
pub const HOSTVARS_KEY: &str = "hostvars";

/// Group for hosts without any group membership
pub const NO_GROUP: &str = "_NOGROUP";

/// Host variable: address to connect to (name-keyed inventories)
pub const VAR_ANSIBLE_HOST: &str = "ansible_host";

/// Host variable: backend host name (address-keyed inventories)
pub const VAR_OMD_NAME: &str = "omd_name";

/// Host variable: backend alias
pub const VAR_OMD_ALIAS: &str = "omd_alias";

/// Host variable: backend custom variables
pub const VAR_OMD_CUSTOM_VARS: &str = "omd_custom_vars";

/// Variables of one host, in insertion order
pub type HostVars = IndexMap<String, Value>;

/// Which host attribute identifies a host in the inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryKey {
    /// Backend host name
    #[default]
    Name,
    /// Host address
    Address,
}

/// Grouped host inventory
///
/// Groups and host variables keep the order in which the builder first saw
/// them; any sorting happens at render time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub(crate) key: InventoryKey,
    pub(crate) groups: IndexMap<String, Vec<String>>,
    pub(crate) hostvars: IndexMap<String, HostVars>,
}

impl Inventory {
    /// Create an empty inventory
    #[must_use]
    pub fn new(key: InventoryKey) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// Identifier kind used for hosts
    #[must_use]
    pub fn key(&self) -> InventoryKey {
        self.key
    }

    /// All groups with their member identifiers
    #[must_use]
    pub fn groups(&self) -> &IndexMap<String, Vec<String>> {
        &self.groups
    }

    /// Members of a single group
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Variables of every host
    #[must_use]
    pub fn hostvars(&self) -> &IndexMap<String, HostVars> {
        &self.hostvars
    }

    /// Variables of a single host
    #[must_use]
    pub fn host_vars(&self, id: &str) -> Option<&HostVars> {
        self.hostvars.get(id)
    }

    /// Number of hosts with variables
    #[must_use]
    pub fn host_count(&self) -> usize {
        self.hostvars.len()
    }

    /// Whether the inventory has no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// `{"_meta": {"hostvars": ...}}` block
struct Meta<'a> {
    hostvars: &'a IndexMap<String, HostVars>,
}

impl Serialize for Meta<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(HOSTVARS_KEY, self.hostvars)?;
        map.end()
    }
}

/// Serializes as a dynamic inventory document: one key per group plus `_meta`
impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len() + 1))?;
        for (group, hosts) in &self.groups {
            map.serialize_entry(group, hosts)?;
        }
        map.serialize_entry(
            META_KEY,
            &Meta {
                hostvars: &self.hostvars,
            },
        )?;
        map.end()
    }
}
