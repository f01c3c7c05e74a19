//! Static catalog of valid services per category, name checking with
//! suggestions, and keyword-based service recommendations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::service::{ServiceId, ServiceSet};
use crate::taxonomy::Taxonomy;
use crate::{Category, Request};

const MAX_SUGGESTIONS: usize = 3;

pub fn services_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Network => &[
            "virtual_network",
            "firewall",
            // listed for the core hub; requested names normalize to `firewall`
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
            "front_door",
        ],
        Category::Security => &[
            "active_directory",
            "entra_id",
            "managed_identity",
            "key_vault",
            "security_center",
            "defender_for_cloud",
            "sentinel",
            "policy",
            "management_groups",
        ],
        Category::Monitoring => &[
            "monitor",
            "log_analytics",
            "application_insights",
            "cost_management",
            "advisor",
        ],
        Category::Backup => &["backup", "site_recovery"],
        Category::Compute => &[
            "virtual_machines",
            "vmss",
            "app_services",
            "web_apps",
            "function_apps",
            "aks",
            "container_instances",
            "service_fabric",
            "batch",
        ],
        Category::Database => &["sql_database", "mysql", "postgresql", "cosmos_db", "redis_cache"],
        Category::Storage => &[
            "storage_accounts",
            "blob_storage",
            "file_storage",
            "queue_storage",
            "table_storage",
            "disk_storage",
            "data_lake",
            "key_vault",
        ],
        Category::Ai => &["cognitive_services", "machine_learning", "bot_service", "search_service"],
        Category::Analytics => &[
            "synapse_analytics",
            "databricks",
            "data_factory",
            "stream_analytics",
            "power_bi",
        ],
        Category::Integration => &[
            "api_management",
            "service_bus",
            "event_hubs",
            "logic_apps",
            "event_grid",
        ],
    }
}

/// True if any category lists `id`.
pub fn is_known(id: &str) -> bool {
    Category::ALL.iter().any(|c| services_for(*c).contains(&id))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub normalized: Vec<ServiceId>,
    /// Raw names as supplied.
    pub invalid: Vec<String>,
    /// Up to three catalog entries per invalid name.
    pub suggestions: BTreeMap<String, Vec<ServiceId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub categories: BTreeMap<Category, CategoryReport>,
}

impl CatalogReport {
    pub fn is_valid(&self) -> bool {
        self.categories.values().all(|r| r.invalid.is_empty())
    }

    /// One line per category with invalid names, or `None` when all are valid.
    pub fn error_message(&self) -> Option<String> {
        let lines: Vec<String> = self
            .categories
            .iter()
            .filter(|(_, r)| !r.invalid.is_empty())
            .map(|(category, r)| {
                let mut line = format!("invalid services in '{category}': {}", r.invalid.join(", "));
                for (name, hints) in &r.suggestions {
                    let hints: Vec<&str> = hints.iter().map(|h| h.as_str()).collect();
                    line.push_str(&format!("; '{name}' -> try: {}", hints.join(", ")));
                }
                line
            })
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Normalize every requested name and check it against its category's
/// catalog entries. Empty categories are omitted from the report.
pub fn validate_service_names(request: &Request, taxonomy: &Taxonomy) -> CatalogReport {
    let mut report = CatalogReport::default();
    for category in Category::ALL {
        let names = request.services(category);
        if names.is_empty() {
            continue;
        }
        let valid = services_for(category);
        let mut entry = CategoryReport::default();
        for raw in names {
            let id = taxonomy.normalize(raw);
            if valid.contains(&id.as_str()) {
                if !entry.normalized.contains(&id) {
                    entry.normalized.push(id);
                }
                continue;
            }
            entry.invalid.push(raw.clone());
            let hints = suggest(raw, valid);
            if !hints.is_empty() {
                entry.suggestions.insert(raw.clone(), hints);
            }
        }
        report.categories.insert(category, entry);
    }
    report
}

fn suggest(raw: &str, valid: &[&str]) -> Vec<ServiceId> {
    let lowered = raw.trim().to_lowercase().replace([' ', '-'], "_");
    if lowered.is_empty() {
        return Vec::new();
    }
    valid
        .iter()
        .filter(|candidate| {
            candidate.contains(lowered.as_str())
                || lowered.contains(*candidate)
                || lowered
                    .split('_')
                    .filter(|part| part.len() > 2)
                    .any(|part| candidate.contains(part))
        })
        .take(MAX_SUGGESTIONS)
        .map(|s| ServiceId::new(*s))
        .collect()
}

type KeywordRule = (&'static [&'static str], &'static [(Category, &'static str)]);

const KEYWORD_RULES: &[KeywordRule] = &[
    (
        &["web", "website", "api", "rest", "http"],
        &[(Category::Compute, "app_services"), (Category::Network, "application_gateway")],
    ),
    (
        &["kubernetes", "container", "docker", "microservices"],
        &[(Category::Compute, "aks"), (Category::Network, "virtual_network")],
    ),
    (&["serverless", "function", "lambda"], &[(Category::Compute, "function_apps")]),
    (
        &["database", "data", "sql", "storage"],
        &[(Category::Database, "sql_database"), (Category::Storage, "blob_storage")],
    ),
    (&["nosql", "document", "mongodb"], &[(Category::Database, "cosmos_db")]),
    (&["cache", "redis", "session"], &[(Category::Database, "redis_cache")]),
    (
        &["security", "authentication", "auth", "login"],
        &[(Category::Security, "key_vault"), (Category::Security, "active_directory")],
    ),
    (&["secrets", "keys", "certificates"], &[(Category::Security, "key_vault")]),
    (
        &["monitoring", "logs", "metrics", "observability"],
        &[(Category::Monitoring, "monitor"), (Category::Monitoring, "application_insights")],
    ),
    (
        &["analytics", "reporting", "dashboard"],
        &[(Category::Analytics, "synapse_analytics"), (Category::Monitoring, "monitor")],
    ),
    (&["integration", "workflow", "automation"], &[(Category::Integration, "logic_apps")]),
    (
        &["messaging", "queue", "events"],
        &[(Category::Integration, "service_bus"), (Category::Integration, "event_hubs")],
    ),
];

/// Keyword lookup over free text. Not language understanding: a keyword
/// matches anywhere in the lowercased text. Networking is always included.
pub fn recommend(text: &str) -> BTreeMap<Category, ServiceSet> {
    let lowered = text.to_lowercase();
    let mut out: BTreeMap<Category, ServiceSet> = BTreeMap::new();
    for (keywords, services) in KEYWORD_RULES {
        if !keywords.iter().any(|k| lowered.contains(k)) {
            continue;
        }
        for (category, id) in *services {
            out.entry(*category).or_default().insert(ServiceId::new(*id));
        }
    }
    out.entry(Category::Network)
        .or_default()
        .insert(ServiceId::new("virtual_network"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(set: &ServiceSet) -> Vec<&str> {
        set.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn every_taxonomy_id_is_in_the_catalog() {
        let tax = Taxonomy::azure();
        for id in tax.hub.iter().chain(&tax.spoke) {
            assert!(is_known(id.as_str()), "{id} missing from catalog");
        }
        for (alias, target) in &tax.aliases {
            assert!(is_known(target.as_str()), "alias {alias} -> {target} not in catalog");
        }
    }

    #[test]
    fn names_are_normalized_per_category() {
        let req = Request::default()
            .with(Category::Compute, ["app_service", "kubernetes", "vm", "vm"])
            .with(Category::Database, ["sql", "cosmosdb"])
            .with(Category::Monitoring, ["azure_monitor", "app_insights"]);
        let report = validate_service_names(&req, &Taxonomy::azure());
        assert!(report.is_valid());
        assert_eq!(report.error_message(), None);
        let compute = &report.categories[&Category::Compute];
        assert_eq!(
            compute.normalized,
            vec![
                ServiceId::new("app_services"),
                ServiceId::new("aks"),
                ServiceId::new("virtual_machines")
            ]
        );
        assert!(!report.categories.contains_key(&Category::Storage));
    }

    #[test]
    fn invalid_names_get_suggestions() {
        let req = Request::default()
            .with(Category::Compute, ["container", "mainframe"])
            .with(Category::Database, ["aks"]);
        let report = validate_service_names(&req, &Taxonomy::azure());
        assert!(!report.is_valid());

        let compute = &report.categories[&Category::Compute];
        assert_eq!(compute.invalid, vec!["container", "mainframe"]);
        assert_eq!(compute.suggestions["container"], vec![ServiceId::new("container_instances")]);
        assert!(!compute.suggestions.contains_key("mainframe"));

        // valid service, wrong category
        assert_eq!(report.categories[&Category::Database].invalid, vec!["aks"]);

        let message = report.error_message().unwrap();
        assert!(message.contains("invalid services in 'compute': container, mainframe"));
        assert!(message.contains("'container' -> try: container_instances"));
    }

    #[test]
    fn recommend_from_keywords() {
        let recs = recommend("A REST API with a Redis session cache and Kubernetes");
        assert_eq!(keys(&recs[&Category::Compute]), vec!["app_services", "aks"]);
        assert_eq!(
            keys(&recs[&Category::Network]),
            vec!["application_gateway", "virtual_network"]
        );
        assert_eq!(keys(&recs[&Category::Database]), vec!["redis_cache"]);
        assert!(!recs.contains_key(&Category::Integration));
    }

    #[test]
    fn recommend_always_includes_networking() {
        let recs = recommend("");
        assert_eq!(recs.len(), 1);
        assert_eq!(keys(&recs[&Category::Network]), vec!["virtual_network"]);
    }

    #[test]
    fn recommended_ids_are_catalog_entries() {
        for (_, services) in KEYWORD_RULES {
            for (category, id) in *services {
                assert!(services_for(*category).contains(id), "{id} not listed under {category}");
            }
        }
    }
}
