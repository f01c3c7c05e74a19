//! Service taxonomy: which identifiers belong to the hub, which to the
//! workload spokes, and how common naming variants map onto canonical keys.
//!
//! The built-in table describes Azure landing zones. A [`Taxonomy`] is plain
//! data, so callers can deserialize an alternate one and hand it to the
//! [`crate::Orchestrator`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::service::ServiceId;

/// Vendor prefixes stripped during normalization, after separators have been
/// collapsed to `_`.
pub const VENDOR_PREFIXES: [&str; 2] = ["azure_", "microsoft_"];

/// Identifier allowed to be both hub and spoke: a shared vault in the hub and
/// a workload vault in each spoke are distinct resources.
pub const DUAL_CONTEXT_SERVICE: &str = "key_vault";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Hub,
    Spoke,
    Both,
    Unclassified,
}

impl Membership {
    pub fn is_hub(&self) -> bool {
        matches!(self, Membership::Hub | Membership::Both)
    }

    pub fn is_spoke(&self) -> bool {
        matches!(self, Membership::Spoke | Membership::Both)
    }
}

/// Service groups that drive spoke subnet layout and per-tier placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(default)]
    pub web: Vec<ServiceId>,
    #[serde(default)]
    pub compute: Vec<ServiceId>,
    #[serde(default)]
    pub database: Vec<ServiceId>,
    #[serde(default)]
    pub container: Vec<ServiceId>,
    #[serde(default)]
    pub integration: Vec<ServiceId>,
}

/// Identifiers that switch optional hub features on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureIds {
    #[serde(default)]
    pub vpn_gateway: Vec<ServiceId>,
    #[serde(default)]
    pub expressroute: Vec<ServiceId>,
    #[serde(default)]
    pub sentinel: Vec<ServiceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub hub: BTreeSet<ServiceId>,
    pub spoke: BTreeSet<ServiceId>,
    /// Lowercased variant -> canonical key.
    #[serde(default)]
    pub aliases: BTreeMap<String, ServiceId>,
    /// Injected into every hub, in this order.
    #[serde(default)]
    pub core_hub: Vec<ServiceId>,
    #[serde(default)]
    pub tiers: TierTable,
    #[serde(default)]
    pub features: FeatureIds,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::azure()
    }
}

fn ids(keys: &[&str]) -> Vec<ServiceId> {
    keys.iter().map(|k| ServiceId::new(*k)).collect()
}

const AZURE_HUB: &[&str] = &[
    // shared network edge
    "firewall",
    // Core hub entry. `normalize` strips the vendor prefix, so a requested
    // "azure_firewall" arrives as `firewall`; the two are separate ids.
    "azure_firewall",
    "network_security_groups",
    "dns",
    "private_dns",
    "bastion",
    "vpn_gateway",
    "expressroute",
    "application_gateway",
    "load_balancer",
    "traffic_manager",
    // identity and security
    "active_directory",
    "entra_id",
    "managed_identity",
    "key_vault",
    "security_center",
    "defender_for_cloud",
    "sentinel",
    // observability and continuity
    "log_analytics",
    "monitor",
    "backup",
    "site_recovery",
    // governance
    "policy",
    "management_groups",
    "cost_management",
    "advisor",
];

const AZURE_SPOKE: &[&str] = &[
    // compute
    "virtual_machines",
    "vmss",
    "app_services",
    "web_apps",
    "function_apps",
    "aks",
    "container_instances",
    "service_fabric",
    "batch",
    // data
    "sql_database",
    "mysql",
    "postgresql",
    "cosmos_db",
    "redis_cache",
    "storage_accounts",
    "blob_storage",
    "file_storage",
    "data_lake",
    "synapse_analytics",
    // integration
    "api_management",
    "service_bus",
    "event_hubs",
    "logic_apps",
    "event_grid",
    // analytics and AI
    "databricks",
    "data_factory",
    "cognitive_services",
    "machine_learning",
    "search_service",
    // workload secrets
    "key_vault",
];

const AZURE_ALIASES: &[(&str, &str)] = &[
    // compute
    ("app_service", "app_services"),
    ("webapp", "app_services"),
    ("web_app", "app_services"),
    ("kubernetes", "aks"),
    ("k8s", "aks"),
    ("container_service", "aks"),
    ("vm", "virtual_machines"),
    ("vms", "virtual_machines"),
    ("virtual_machine", "virtual_machines"),
    ("compute", "virtual_machines"),
    ("scale_set", "vmss"),
    ("function", "function_apps"),
    ("functions", "function_apps"),
    ("function_app", "function_apps"),
    ("serverless", "function_apps"),
    ("aci", "container_instances"),
    // network
    ("vnet", "virtual_network"),
    ("virtual_network_gateway", "vpn_gateway"),
    ("vpn", "vpn_gateway"),
    ("express_route", "expressroute"),
    ("lb", "load_balancer"),
    ("alb", "application_gateway"),
    ("app_gateway", "application_gateway"),
    ("app_gw", "application_gateway"),
    ("waf", "application_gateway"),
    ("cdn", "front_door"),
    ("nsg", "network_security_groups"),
    ("nsgs", "network_security_groups"),
    // database
    ("database", "sql_database"),
    ("sql", "sql_database"),
    ("sql_server", "sql_database"),
    ("cosmosdb", "cosmos_db"),
    ("cosmos", "cosmos_db"),
    ("mysql_db", "mysql"),
    ("database_for_mysql", "mysql"),
    ("postgres", "postgresql"),
    ("postgres_db", "postgresql"),
    ("database_for_postgresql", "postgresql"),
    ("cache", "redis_cache"),
    ("redis", "redis_cache"),
    // storage
    ("storage", "storage_accounts"),
    ("storage_account", "storage_accounts"),
    ("blob", "blob_storage"),
    ("files", "file_storage"),
    ("file_shares", "file_storage"),
    ("queue", "queue_storage"),
    ("table", "table_storage"),
    ("disk", "disk_storage"),
    ("disks", "disk_storage"),
    // security
    ("ad", "active_directory"),
    ("aad", "active_directory"),
    ("keyvault", "key_vault"),
    ("vault", "key_vault"),
    ("asc", "security_center"),
    ("defender", "defender_for_cloud"),
    // monitoring
    ("monitoring", "monitor"),
    ("logs", "log_analytics"),
    ("log_analytics_workspace", "log_analytics"),
    ("app_insights", "application_insights"),
    ("insights", "application_insights"),
    // ai
    ("ml", "machine_learning"),
    ("cognitive", "cognitive_services"),
    ("ai", "cognitive_services"),
    ("bot", "bot_service"),
    ("chatbot", "bot_service"),
    ("search", "search_service"),
    // analytics
    ("analytics", "synapse_analytics"),
    ("synapse", "synapse_analytics"),
    ("adf", "data_factory"),
    ("datafactory", "data_factory"),
    ("streaming", "stream_analytics"),
    ("stream", "stream_analytics"),
    ("powerbi", "power_bi"),
    // integration
    ("logic_app", "logic_apps"),
    ("workflow", "logic_apps"),
    ("servicebus", "service_bus"),
    ("sb", "service_bus"),
    ("messaging", "service_bus"),
    ("eventgrid", "event_grid"),
    ("events", "event_grid"),
    ("eventhub", "event_hubs"),
    ("event_hub", "event_hubs"),
    ("api_mgmt", "api_management"),
    ("apim", "api_management"),
    // continuity
    ("asr", "site_recovery"),
    ("disaster_recovery", "site_recovery"),
    ("dr", "site_recovery"),
];

impl Taxonomy {
    /// The built-in Azure landing zone taxonomy.
    pub fn azure() -> Self {
        Self {
            hub: ids(AZURE_HUB).into_iter().collect(),
            spoke: ids(AZURE_SPOKE).into_iter().collect(),
            aliases: AZURE_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), ServiceId::new(*to)))
                .collect(),
            core_hub: ids(&["azure_firewall", "bastion", "dns"]),
            tiers: TierTable {
                web: ids(&["app_services", "web_apps"]),
                compute: ids(&["virtual_machines", "aks", "function_apps"]),
                database: ids(&["sql_database", "cosmos_db", "mysql", "postgresql"]),
                container: ids(&["aks", "container_instances"]),
                integration: ids(&["api_management", "service_bus", "event_hubs"]),
            },
            features: FeatureIds {
                vpn_gateway: ids(&["vpn_gateway"]),
                expressroute: ids(&["expressroute"]),
                sentinel: ids(&["sentinel"]),
            },
        }
    }

    /// Canonicalize a raw name: lowercase, collapse whitespace and dashes to
    /// `_`, strip vendor prefixes, then resolve aliases. Unknown names come
    /// back cleaned but otherwise unchanged. `normalize(normalize(x)) ==
    /// normalize(x)` holds as long as no alias target carries a vendor prefix
    /// or is itself an alias.
    pub fn normalize(&self, raw: &str) -> ServiceId {
        let mut key = raw
            .trim()
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        while let Some(rest) = VENDOR_PREFIXES.iter().find_map(|p| key.strip_prefix(p)) {
            key = rest.to_string();
        }

        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => ServiceId::new(key),
        }
    }

    pub fn is_hub(&self, id: &str) -> bool {
        self.hub.contains(id)
    }

    pub fn is_spoke(&self, id: &str) -> bool {
        self.spoke.contains(id)
    }

    /// Exact-match membership of an already normalized id.
    pub fn membership(&self, id: &str) -> Membership {
        match (self.is_hub(id), self.is_spoke(id)) {
            (true, true) => Membership::Both,
            (true, false) => Membership::Hub,
            (false, true) => Membership::Spoke,
            (false, false) => Membership::Unclassified,
        }
    }

    /// Identifiers present in both sets.
    pub fn overlap(&self) -> BTreeSet<ServiceId> {
        self.hub.intersection(&self.spoke).cloned().collect()
    }

    /// Overlap entries other than the sanctioned dual-context service.
    pub fn unexpected_overlap(&self) -> Vec<ServiceId> {
        self.overlap()
            .into_iter()
            .filter(|id| id.as_str() != DUAL_CONTEXT_SERVICE)
            .collect()
    }
}
