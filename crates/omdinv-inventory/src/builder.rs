//! Inventory construction from Livestatus host rows

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::types::{
    HostRecord, HostVars, Inventory, InventoryKey, META_KEY, NO_GROUP, VAR_ANSIBLE_HOST,
    VAR_OMD_ALIAS, VAR_OMD_CUSTOM_VARS, VAR_OMD_NAME,
};

/// Characters that are not allowed in inventory group names
pub const FORBIDDEN_GROUP_CHARS: &[char] = &['.', ',', ';', ':', '[', ']', '/', ' '];

/// Replacement for every forbidden character
pub const GROUP_CHAR_REPLACEMENT: char = '_';

/// Replace each forbidden character in a group name
///
/// Idempotent: the replacement character is never itself forbidden.
#[must_use]
pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FORBIDDEN_GROUP_CHARS.contains(&c) {
                GROUP_CHAR_REPLACEMENT
            } else {
                c
            }
        })
        .collect()
}

/// Incremental inventory builder
///
/// Hosts are appended in backend order. In address-keyed mode only the first
/// host seen with a given address gets a hostvars entry; later hosts sharing
/// that address still join their groups. In name-keyed mode a repeated name
/// replaces the earlier variables.
#[derive(Debug)]
pub struct InventoryBuilder {
    inventory: Inventory,
    duplicates: usize,
}

impl InventoryBuilder {
    /// Create a builder keyed by name or address
    #[must_use]
    pub fn new(key: InventoryKey) -> Self {
        Self {
            inventory: Inventory::new(key),
            duplicates: 0,
        }
    }

    /// Add one host
    pub fn add_host(&mut self, host: &HostRecord) {
        let id = match self.inventory.key {
            InventoryKey::Name => &host.name,
            InventoryKey::Address => &host.address,
        };

        let no_group = [NO_GROUP.to_string()];
        let groups = if host.groups.is_empty() {
            &no_group[..]
        } else {
            &host.groups[..]
        };

        for group in groups {
            let group = sanitize_group_name(group);
            if group == META_KEY {
                warn!(host = %host.name, "group name collides with reserved key, skipping");
                continue;
            }
            self.inventory
                .groups
                .entry(group)
                .or_default()
                .push(id.clone());
        }

        if self.inventory.key == InventoryKey::Address && self.inventory.hostvars.contains_key(id) {
            self.duplicates += 1;
            warn!(
                address = %id,
                host = %host.name,
                "shared address, keeping variables of first host"
            );
            return;
        }

        let vars = self.host_vars(host);
        self.inventory.hostvars.insert(id.clone(), vars);
    }

    /// Variables recorded for a host
    fn host_vars(&self, host: &HostRecord) -> HostVars {
        let mut vars = HostVars::new();

        match self.inventory.key {
            InventoryKey::Name => {
                vars.insert(VAR_ANSIBLE_HOST.to_string(), Value::from(host.address.as_str()));
            }
            InventoryKey::Address => {
                vars.insert(VAR_OMD_NAME.to_string(), Value::from(host.name.as_str()));
            }
        }
        vars.insert(VAR_OMD_ALIAS.to_string(), Value::from(host.alias.as_str()));

        if !host.custom_variables.is_empty() {
            let custom: serde_json::Map<String, Value> = host
                .custom_variables
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            vars.insert(VAR_OMD_CUSTOM_VARS.to_string(), Value::Object(custom));
        }

        vars
    }

    /// Number of hosts whose variables were dropped for a shared address
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Inventory {
        self.inventory
    }
}

impl Inventory {
    /// Build an inventory from host rows in backend order
    #[instrument(skip(hosts), fields(count = hosts.len()))]
    #[must_use]
    pub fn from_hosts(hosts: &[HostRecord], key: InventoryKey) -> Self {
        let mut builder = InventoryBuilder::new(key);
        for host in hosts {
            builder.add_host(host);
        }

        if builder.duplicates() > 0 {
            warn!(
                duplicates = builder.duplicates(),
                "hosts with shared addresses have no variables of their own"
            );
        }

        let inventory = builder.build();
        debug!(
            groups = inventory.groups().len(),
            hostvars = inventory.host_count(),
            "inventory built"
        );
        inventory
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn scenario_hosts() -> Vec<HostRecord> {
        vec![
            HostRecord::new("10.0.0.1", "web1", "Web One").with_groups(["prod", "web"]),
            HostRecord::new("10.0.0.2", "web2", "Web Two"),
        ]
    }

    #[test]
    fn test_sanitize_group_name() {
        assert_eq!(sanitize_group_name("db.prod 01"), "db_prod_01");
        assert_eq!(sanitize_group_name("a,b;c:d[e]f/g"), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_group_name("linux-servers"), "linux-servers");
        assert_eq!(sanitize_group_name(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for name in ["db.prod 01", "[dmz]/edge", "plain", "ümlaut. grüppe", "___"] {
            let once = sanitize_group_name(name);
            assert_eq!(sanitize_group_name(&once), once);
        }
    }

    #[test]
    fn test_build_by_name() {
        let inventory = Inventory::from_hosts(&scenario_hosts(), InventoryKey::Name);

        let groups: Vec<(&str, Vec<&str>)> = inventory
            .groups()
            .iter()
            .map(|(g, hosts)| (g.as_str(), hosts.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("prod", vec!["web1"]),
                ("web", vec!["web1"]),
                ("_NOGROUP", vec!["web2"]),
            ]
        );

        assert_eq!(inventory.host_vars("web1").unwrap()[VAR_ANSIBLE_HOST], "10.0.0.1");
        assert_eq!(inventory.host_vars("web2").unwrap()[VAR_ANSIBLE_HOST], "10.0.0.2");
        assert_eq!(inventory.host_vars("web1").unwrap()[VAR_OMD_ALIAS], "Web One");
        assert_eq!(inventory.key(), InventoryKey::Name);
    }

    #[test]
    fn test_build_by_address() {
        let inventory = Inventory::from_hosts(&scenario_hosts(), InventoryKey::Address);

        assert_eq!(inventory.group("prod").unwrap(), ["10.0.0.1"]);
        assert_eq!(inventory.group(NO_GROUP).unwrap(), ["10.0.0.2"]);
        assert_eq!(inventory.host_vars("10.0.0.1").unwrap()[VAR_OMD_NAME], "web1");
        assert!(inventory.host_vars("10.0.0.1").unwrap().get(VAR_ANSIBLE_HOST).is_none());
    }

    #[test]
    fn test_hostvars_keys_are_distinct_names() {
        let hosts = vec![
            HostRecord::new("10.0.0.1", "a", "A").with_groups(["g1"]),
            HostRecord::new("10.0.0.1", "b", "B").with_groups(["g1", "g2"]),
            HostRecord::new("", "c", "C"),
        ];

        let inventory = Inventory::from_hosts(&hosts, InventoryKey::Name);

        let keys: BTreeSet<&str> = inventory.hostvars().keys().map(String::as_str).collect();
        let names: BTreeSet<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(keys, names);
    }

    #[test]
    fn test_duplicate_address_keeps_first() {
        let hosts = vec![
            HostRecord::new("10.0.0.1", "first", "First").with_groups(["g1"]),
            HostRecord::new("10.0.0.9", "other", "Other").with_groups(["g1"]),
            HostRecord::new("10.0.0.1", "second", "Second")
                .with_groups(["g2"])
                .with_custom_variable("ROLE", "db"),
        ];

        let mut builder = InventoryBuilder::new(InventoryKey::Address);
        for host in &hosts {
            builder.add_host(host);
        }
        assert_eq!(builder.duplicates(), 1);
        let inventory = builder.build();

        let keys: BTreeSet<&str> = inventory.hostvars().keys().map(String::as_str).collect();
        assert_eq!(keys, BTreeSet::from(["10.0.0.1", "10.0.0.9"]));

        let vars = inventory.host_vars("10.0.0.1").unwrap();
        assert_eq!(vars[VAR_OMD_NAME], "first");
        assert_eq!(vars[VAR_OMD_ALIAS], "First");
        assert!(vars.get(VAR_OMD_CUSTOM_VARS).is_none());

        // The second host still shows up in its group
        assert_eq!(inventory.group("g1").unwrap(), ["10.0.0.1", "10.0.0.9"]);
        assert_eq!(inventory.group("g2").unwrap(), ["10.0.0.1"]);
    }

    #[test]
    fn test_repeated_name_is_not_deduplicated() {
        let hosts = vec![
            HostRecord::new("10.0.0.1", "web1", "Old").with_groups(["g1"]),
            HostRecord::new("10.0.0.2", "web1", "New").with_groups(["g2"]),
        ];

        let mut builder = InventoryBuilder::new(InventoryKey::Name);
        for host in &hosts {
            builder.add_host(host);
        }
        assert_eq!(builder.duplicates(), 0);
        let inventory = builder.build();

        assert_eq!(inventory.host_count(), 1);
        let vars = inventory.host_vars("web1").unwrap();
        assert_eq!(vars[VAR_ANSIBLE_HOST], "10.0.0.2");
        assert_eq!(vars[VAR_OMD_ALIAS], "New");
        assert_eq!(inventory.group("g1").unwrap(), ["web1"]);
        assert_eq!(inventory.group("g2").unwrap(), ["web1"]);
    }

    #[test]
    fn test_ungrouped_host_only_in_sentinel_group() {
        let hosts = vec![HostRecord::new("10.0.0.5", "lonely", "Lonely")];

        let inventory = Inventory::from_hosts(&hosts, InventoryKey::Name);

        assert_eq!(inventory.groups().len(), 1);
        assert_eq!(inventory.group(NO_GROUP).unwrap(), ["lonely"]);
    }

    #[test]
    fn test_groups_are_sanitized_and_merged() {
        let hosts = vec![
            HostRecord::new("10.0.0.1", "a", "A").with_groups(["db.prod 01"]),
            HostRecord::new("10.0.0.2", "b", "B").with_groups(["db_prod_01", "db prod.01"]),
        ];

        let inventory = Inventory::from_hosts(&hosts, InventoryKey::Name);

        assert_eq!(inventory.groups().len(), 1);
        assert_eq!(inventory.group("db_prod_01").unwrap(), ["a", "b", "b"]);
    }

    #[test]
    fn test_custom_variables_in_hostvars() {
        let hosts = vec![
            HostRecord::new("10.0.0.1", "web1", "Web One")
                .with_groups(["web"])
                .with_custom_variable("ROLE", "frontend")
                .with_custom_variable("TAGS", "a b"),
        ];

        let inventory = Inventory::from_hosts(&hosts, InventoryKey::Name);

        let vars = inventory.host_vars("web1").unwrap();
        let keys: Vec<&str> = vars.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![VAR_ANSIBLE_HOST, VAR_OMD_ALIAS, VAR_OMD_CUSTOM_VARS]);
        assert_eq!(vars[VAR_OMD_CUSTOM_VARS]["ROLE"], "frontend");
    }

    #[test]
    fn test_reserved_group_name_is_skipped() {
        let hosts =
            vec![HostRecord::new("10.0.0.1", "web1", "Web One").with_groups(["_meta", "web"])];

        let inventory = Inventory::from_hosts(&hosts, InventoryKey::Name);

        assert!(inventory.group(META_KEY).is_none());
        assert_eq!(inventory.group("web").unwrap(), ["web1"]);
    }

    #[test]
    fn test_empty_input() {
        let inventory = Inventory::from_hosts(&[], InventoryKey::Name);

        assert!(inventory.is_empty());
        assert_eq!(inventory.host_count(), 0);
    }
}
