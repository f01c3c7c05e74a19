pub mod catalog;
pub mod cidr;
pub mod classify;
pub mod error;
pub mod hub;
pub mod pipeline;
pub mod principles;
pub mod service;
pub mod spoke;
pub mod taxonomy;
pub mod validate;

pub use catalog::{recommend, validate_service_names, CatalogReport};
pub use cidr::Cidr;
pub use classify::{categorize, Categorized, Classification, Classifier};
pub use error::{Error, Result};
pub use hub::HubContext;
pub use pipeline::{MergedTopology, Orchestrator, PipelineOutcome, Stage, TraceEntry};
pub use principles::PRINCIPLES;
pub use service::{ServiceId, ServiceSet};
pub use spoke::SpokeContext;
pub use taxonomy::{Membership, Taxonomy};
pub use validate::{validate_topology, Severity, ValidationReport};

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Request ---

/// Upper bound on identifiers per category accepted by [`Request::check_limits`].
pub const MAX_SERVICES_PER_CATEGORY: usize = 50;
/// Upper bound on the length of a single raw identifier.
pub const MAX_IDENTIFIER_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Network,
    Security,
    Monitoring,
    Backup,
    Compute,
    Database,
    Storage,
    Ai,
    Analytics,
    Integration,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Network,
        Category::Security,
        Category::Monitoring,
        Category::Backup,
        Category::Compute,
        Category::Database,
        Category::Storage,
        Category::Ai,
        Category::Analytics,
        Category::Integration,
    ];

    /// Categories whose identifiers are candidates for the hub.
    pub const HUB_POOL: [Category; 4] = [
        Category::Network,
        Category::Security,
        Category::Monitoring,
        Category::Backup,
    ];

    /// Categories whose identifiers are candidates for the workload spokes.
    pub const SPOKE_POOL: [Category; 6] = [
        Category::Compute,
        Category::Database,
        Category::Storage,
        Category::Ai,
        Category::Analytics,
        Category::Integration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Network => "network",
            Category::Security => "security",
            Category::Monitoring => "monitoring",
            Category::Backup => "backup",
            Category::Compute => "compute",
            Category::Database => "database",
            Category::Storage => "storage",
            Category::Ai => "ai",
            Category::Analytics => "analytics",
            Category::Integration => "integration",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scalability {
    Low,
    #[default]
    #[serde(alias = "moderate")]
    Medium,
    High,
    Elastic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPosture {
    #[default]
    Standard,
    ZeroTrust,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    #[default]
    Basic,
    Comprehensive,
}

/// What the caller asked for: raw service names per category plus three
/// scalar preferences. Names are normalized by the classifier, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Request {
    #[serde(default, alias = "network_services")]
    pub network: Vec<String>,
    #[serde(default, alias = "security_services")]
    pub security: Vec<String>,
    #[serde(default, alias = "monitoring_services")]
    pub monitoring: Vec<String>,
    /// Backup and disaster-recovery services (hub pool).
    #[serde(default)]
    pub backup_services: Vec<String>,
    #[serde(default, alias = "compute_services")]
    pub compute: Vec<String>,
    #[serde(default, alias = "database_services")]
    pub database: Vec<String>,
    #[serde(default, alias = "storage_services")]
    pub storage: Vec<String>,
    #[serde(default, alias = "ai_services")]
    pub ai: Vec<String>,
    #[serde(default, alias = "analytics_services")]
    pub analytics: Vec<String>,
    #[serde(default, alias = "integration_services")]
    pub integration: Vec<String>,
    #[serde(default)]
    pub scalability: Scalability,
    #[serde(default)]
    pub security_posture: SecurityPosture,
    #[serde(default)]
    pub backup: BackupPolicy,
}

impl Request {
    /// Parse a request from JSON. Unknown fields are ignored.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn services(&self, category: Category) -> &[String] {
        match category {
            Category::Network => &self.network,
            Category::Security => &self.security,
            Category::Monitoring => &self.monitoring,
            Category::Backup => &self.backup_services,
            Category::Compute => &self.compute,
            Category::Database => &self.database,
            Category::Storage => &self.storage,
            Category::Ai => &self.ai,
            Category::Analytics => &self.analytics,
            Category::Integration => &self.integration,
        }
    }

    fn services_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Network => &mut self.network,
            Category::Security => &mut self.security,
            Category::Monitoring => &mut self.monitoring,
            Category::Backup => &mut self.backup_services,
            Category::Compute => &mut self.compute,
            Category::Database => &mut self.database,
            Category::Storage => &mut self.storage,
            Category::Ai => &mut self.ai,
            Category::Analytics => &mut self.analytics,
            Category::Integration => &mut self.integration,
        }
    }

    /// Append raw names to a category.
    pub fn with<I, S>(mut self, category: Category, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services_mut(category)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.services(*c).is_empty())
    }

    /// Reject oversized input before it reaches the pipeline.
    pub fn check_limits(&self) -> Result<()> {
        for category in Category::ALL {
            let names = self.services(category);
            if names.len() > MAX_SERVICES_PER_CATEGORY {
                return Err(Error::TooManyServices {
                    category,
                    count: names.len(),
                    max: MAX_SERVICES_PER_CATEGORY,
                });
            }
            let too_long = names
                .iter()
                .map(|n| n.chars().count())
                .find(|&len| len > MAX_IDENTIFIER_LEN);
            if let Some(length) = too_long {
                return Err(Error::IdentifierTooLong {
                    category,
                    length,
                    max: MAX_IDENTIFIER_LEN,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_short_and_legacy_keys() {
        let req = Request::from_json(
            r#"{
                "network_services": ["firewall"],
                "compute": ["vm"],
                "backup_services": ["backup"],
                "business_objective": "ignored",
                "scalability": "moderate",
                "security_posture": "zero_trust"
            }"#,
        )
        .unwrap();
        assert_eq!(req.network, vec!["firewall"]);
        assert_eq!(req.compute, vec!["vm"]);
        assert_eq!(req.services(Category::Backup), ["backup".to_string()]);
        assert_eq!(req.scalability, Scalability::Medium);
        assert_eq!(req.security_posture, SecurityPosture::ZeroTrust);
        assert_eq!(req.backup, BackupPolicy::Basic);
    }

    #[test]
    fn empty_json_is_an_empty_request() {
        let req = Request::from_json("{}").unwrap();
        assert!(req.is_empty());
        assert_eq!(req, Request::default());
    }

    #[test]
    fn unknown_preference_value_is_malformed() {
        let err = Request::from_json(r#"{"scalability": "infinite"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn limits_reject_oversized_categories() {
        let many: Vec<String> = (0..=MAX_SERVICES_PER_CATEGORY).map(|i| format!("svc_{i}")).collect();
        let req = Request::default().with(Category::Storage, many);
        match req.check_limits() {
            Err(Error::TooManyServices { category, count, .. }) => {
                assert_eq!(category, Category::Storage);
                assert_eq!(count, MAX_SERVICES_PER_CATEGORY + 1);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let req = Request::default().with(Category::Ai, ["x".repeat(MAX_IDENTIFIER_LEN + 1)]);
        assert!(matches!(req.check_limits(), Err(Error::IdentifierTooLong { .. })));

        let req = Request::default().with(Category::Compute, ["aks"]);
        assert!(req.check_limits().is_ok());
    }

    #[test]
    fn identifier_limit_counts_characters() {
        // 600 characters, 1200 bytes
        let req = Request::default().with(Category::Compute, ["é".repeat(600)]);
        assert!(req.check_limits().is_ok());

        let req = Request::default().with(Category::Compute, ["é".repeat(MAX_IDENTIFIER_LEN + 1)]);
        match req.check_limits() {
            Err(Error::IdentifierTooLong { category, length, max }) => {
                assert_eq!(category, Category::Compute);
                assert_eq!(length, MAX_IDENTIFIER_LEN + 1);
                assert_eq!(max, MAX_IDENTIFIER_LEN);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
