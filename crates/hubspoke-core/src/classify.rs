use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::service::ServiceSet;
use crate::taxonomy::Taxonomy;
use crate::{Category, Request};

/// Result of splitting a request into hub and spoke services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub hub: ServiceSet,
    pub spoke: ServiceSet,
    /// Normalized ids that ended up on neither side.
    pub unclassified: ServiceSet,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    taxonomy: Arc<Taxonomy>,
}

impl Classifier {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Hub candidates come from the network/security/monitoring/backup
    /// categories, spoke candidates from the workload categories. Each pool
    /// keeps only members of its own side, then the core hub set is appended.
    pub fn classify(&self, request: &Request) -> Classification {
        let tax = &*self.taxonomy;
        let mut hub = ServiceSet::new();
        let mut spoke = ServiceSet::new();
        let mut candidates = ServiceSet::new();

        for category in Category::HUB_POOL {
            for raw in request.services(category) {
                let id = tax.normalize(raw);
                if id.as_str().is_empty() {
                    continue;
                }
                if tax.membership(id.as_str()).is_hub() {
                    hub.insert(id.clone());
                }
                candidates.insert(id);
            }
        }

        for category in Category::SPOKE_POOL {
            for raw in request.services(category) {
                let id = tax.normalize(raw);
                if id.as_str().is_empty() {
                    continue;
                }
                if tax.membership(id.as_str()).is_spoke() {
                    spoke.insert(id.clone());
                }
                candidates.insert(id);
            }
        }

        hub.extend(tax.core_hub.iter().cloned());

        let unclassified: ServiceSet = candidates
            .into_iter()
            .filter(|id| !hub.contains(id.as_str()) && !spoke.contains(id.as_str()))
            .collect();

        if !unclassified.is_empty() {
            debug!(
                ids = ?unclassified.as_slice(),
                "identifiers matched neither hub nor spoke"
            );
        }
        debug!(hub = hub.len(), spoke = spoke.len(), "classified request");

        Classification {
            hub,
            spoke,
            unclassified,
        }
    }
}

/// A flat, pool-less split of names, for callers that have no categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Categorized {
    pub hub: ServiceSet,
    pub spoke: ServiceSet,
    pub uncategorized: ServiceSet,
}

/// Split names by membership alone. `key_vault` lands on both sides; no core
/// services are injected.
pub fn categorize<S: AsRef<str>>(names: &[S], taxonomy: &Taxonomy) -> Categorized {
    let mut out = Categorized::default();
    for raw in names {
        let id = taxonomy.normalize(raw.as_ref());
        if id.as_str().is_empty() {
            continue;
        }
        let membership = taxonomy.membership(id.as_str());
        if membership.is_hub() {
            out.hub.insert(id.clone());
        }
        if membership.is_spoke() {
            out.spoke.insert(id.clone());
        }
        if !membership.is_hub() && !membership.is_spoke() {
            out.uncategorized.insert(id);
        }
    }
    out
}
