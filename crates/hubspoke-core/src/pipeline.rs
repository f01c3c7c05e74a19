//! The three-stage pipeline: hub, spoke, merge.
//!
//! Each stage consumes the previous state by value and appends exactly one
//! entry to the execution trace. Stages are total; failure can only come
//! from the request gate or the post-merge invariant gate in
//! [`Orchestrator::execute`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

use crate::classify::{Classification, Classifier};
use crate::error::Error;
use crate::hub::{self, ConnectivityMatrix, HubContext, HubNetwork, SecurityPolicies, SharedInfrastructure};
use crate::service::ServiceSet;
use crate::spoke::{self, DataFlow, ResourceDependencies, ScalingConfiguration, SpokeContext, WorkloadSpoke};
use crate::taxonomy::Taxonomy;
use crate::{validate, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Hub,
    Spoke,
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitecturePattern {
    HubAndSpoke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubView {
    pub services: ServiceSet,
    pub network: HubNetwork,
    pub infrastructure: SharedInfrastructure,
    pub security: SecurityPolicies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokeView {
    pub services: ServiceSet,
    pub workloads: BTreeMap<String, WorkloadSpoke>,
    pub data_flow: DataFlow,
    pub dependencies: ResourceDependencies,
    pub scaling: ScalingConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub success: bool,
    pub hub_services_count: usize,
    pub spoke_services_count: usize,
    pub unclassified_count: usize,
    pub diagram_ready: bool,
    pub architecture_pattern: ArchitecturePattern,
}

/// Everything a renderer needs. Contains no timestamps, so identical
/// requests produce identical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTopology {
    pub hub: HubView,
    pub spokes: SpokeView,
    pub connectivity: ConnectivityMatrix,
    pub architecture_pattern: ArchitecturePattern,
    pub unclassified: ServiceSet,
    pub summary: Summary,
    pub trace: Vec<TraceEntry>,
}

/// Result of [`Orchestrator::execute`]. On failure `trace` holds the stages
/// that completed before the error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<MergedTopology>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trace: Vec<TraceEntry>,
}

enum PipelineState {
    Hub,
    Spoke {
        classification: Classification,
        hub: HubContext,
    },
    Merge {
        classification: Classification,
        hub: HubContext,
        spoke: SpokeContext,
    },
    Done(MergedTopology),
}

struct Failure<E> {
    error: E,
    trace: Vec<TraceEntry>,
}

/// Shareable across threads; holds only the immutable taxonomy.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    taxonomy: Arc<Taxonomy>,
    classifier: Classifier,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(Arc::new(Taxonomy::azure()))
    }
}

impl Orchestrator {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            classifier: Classifier::new(taxonomy.clone()),
            taxonomy,
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Run all three stages. Never fails.
    pub fn run(&self, request: &Request) -> MergedTopology {
        match self.drive(request, |_| Ok::<(), Infallible>(())) {
            Ok(topology) => topology,
            Err(failure) => match failure.error {},
        }
    }

    /// Check request limits, run the pipeline, then check the merged
    /// topology's blocking invariants. Failures are captured, not returned.
    pub fn execute(&self, request: &Request) -> PipelineOutcome {
        if let Err(e) = request.check_limits() {
            return PipelineOutcome::failed(e, Vec::new());
        }
        let gate = |t: &MergedTopology| validate::check_invariants(t, &self.taxonomy);
        match self.drive(request, gate) {
            Ok(topology) => PipelineOutcome {
                success: true,
                trace: topology.trace.clone(),
                topology: Some(topology),
                error: None,
            },
            Err(failure) => PipelineOutcome::failed(failure.error, failure.trace),
        }
    }

    /// The gate runs on the merged value before the merge stage is recorded
    /// as complete.
    fn drive<E>(
        &self,
        request: &Request,
        gate: impl Fn(&MergedTopology) -> Result<(), E>,
    ) -> Result<MergedTopology, Failure<E>> {
        let mut trace = Vec::with_capacity(3);
        let mut state = PipelineState::Hub;
        loop {
            state = match state {
                PipelineState::Hub => {
                    let classification = self.classifier.classify(request);
                    let hub = hub::synthesize(request, &classification.hub, &self.taxonomy);
                    info!(hub_services = hub.hub_services.len(), "hub stage complete");
                    trace.push(TraceEntry {
                        stage: Stage::Hub,
                        message: "Hub agent completed successfully".to_string(),
                    });
                    PipelineState::Spoke {
                        classification,
                        hub,
                    }
                }
                PipelineState::Spoke {
                    classification,
                    hub,
                } => {
                    let spoke =
                        spoke::synthesize(request, &classification.spoke, &hub, &self.taxonomy);
                    info!(spoke_services = spoke.spoke_services.len(), "spoke stage complete");
                    trace.push(TraceEntry {
                        stage: Stage::Spoke,
                        message: "Spoke agent completed successfully".to_string(),
                    });
                    PipelineState::Merge {
                        classification,
                        hub,
                        spoke,
                    }
                }
                PipelineState::Merge {
                    classification,
                    hub,
                    spoke,
                } => {
                    let mut topology = merge(classification, hub, spoke, trace.clone());
                    if let Err(error) = gate(&topology) {
                        return Err(Failure { error, trace });
                    }
                    let entry = TraceEntry {
                        stage: Stage::Merge,
                        message: "Results merged successfully".to_string(),
                    };
                    trace.push(entry.clone());
                    topology.trace.push(entry);
                    info!(
                        hub = topology.summary.hub_services_count,
                        spoke = topology.summary.spoke_services_count,
                        "merge stage complete"
                    );
                    PipelineState::Done(topology)
                }
                PipelineState::Done(topology) => return Ok(topology),
            };
        }
    }
}

impl PipelineOutcome {
    fn failed(error: Error, trace: Vec<TraceEntry>) -> Self {
        tracing::warn!(%error, completed = trace.len(), "pipeline failed");
        Self {
            success: false,
            topology: None,
            error: Some(error.to_string()),
            trace,
        }
    }
}

fn merge(
    classification: Classification,
    hub: HubContext,
    spoke: SpokeContext,
    trace: Vec<TraceEntry>,
) -> MergedTopology {
    let summary = Summary {
        success: true,
        hub_services_count: hub.hub_services.len(),
        spoke_services_count: spoke.spoke_services.len(),
        unclassified_count: classification.unclassified.len(),
        diagram_ready: true,
        architecture_pattern: ArchitecturePattern::HubAndSpoke,
    };
    MergedTopology {
        hub: HubView {
            services: hub.hub_services,
            network: hub.network_topology,
            infrastructure: hub.shared_infrastructure,
            security: hub.security_policies,
        },
        spokes: SpokeView {
            services: spoke.spoke_services,
            workloads: spoke.workload_components,
            data_flow: spoke.data_flow,
            dependencies: spoke.resource_dependencies,
            scaling: spoke.scaling_configuration,
        },
        connectivity: hub.connectivity_matrix,
        architecture_pattern: ArchitecturePattern::HubAndSpoke,
        unclassified: classification.unclassified,
        summary,
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceId;
    use crate::{Category, MAX_SERVICES_PER_CATEGORY};

    fn stages(trace: &[TraceEntry]) -> Vec<Stage> {
        trace.iter().map(|e| e.stage).collect()
    }

    #[test]
    fn run_records_each_stage_once() {
        let topo = Orchestrator::default().run(&Request::default());
        assert_eq!(stages(&topo.trace), vec![Stage::Hub, Stage::Spoke, Stage::Merge]);
        assert_eq!(topo.trace[2].message, "Results merged successfully");
        assert_eq!(topo.architecture_pattern, ArchitecturePattern::HubAndSpoke);
        assert!(topo.summary.success && topo.summary.diagram_ready);
        assert_eq!(topo.summary.hub_services_count, 3);
        assert_eq!(topo.summary.spoke_services_count, 0);
    }

    #[test]
    fn merged_shape_on_the_wire() {
        let req = Request::default().with(Category::Compute, ["vm", "quantum"]);
        let json = serde_json::to_value(Orchestrator::default().run(&req)).unwrap();
        assert_eq!(json["architecture_pattern"], "hub_and_spoke");
        assert_eq!(json["hub"]["network"]["hub_vnet"]["name"], "Hub-VNet");
        assert_eq!(json["spokes"]["services"], serde_json::json!(["virtual_machines"]));
        assert_eq!(json["unclassified"], serde_json::json!(["quantum"]));
        assert_eq!(json["connectivity"]["hub_to_spoke_connectivity"], "vnet_peering");
        assert_eq!(json["summary"]["unclassified_count"], 1);
        assert_eq!(json["trace"][0]["stage"], "hub");
    }

    #[test]
    fn execute_succeeds_with_full_trace() {
        let outcome = Orchestrator::default().execute(&Request::default());
        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(stages(&outcome.trace), vec![Stage::Hub, Stage::Spoke, Stage::Merge]);
        assert_eq!(outcome.topology.map(|t| t.trace), Some(outcome.trace));
    }

    #[test]
    fn execute_rejects_oversized_request_before_any_stage() {
        let many: Vec<String> = (0..=MAX_SERVICES_PER_CATEGORY).map(|i| format!("vm{i}")).collect();
        let outcome = Orchestrator::default().execute(&Request::default().with(Category::Compute, many));
        assert!(!outcome.success);
        assert!(outcome.topology.is_none());
        assert!(outcome.trace.is_empty());
        assert!(outcome.error.unwrap().contains("too many services"));
    }

    #[test]
    fn invariant_failure_keeps_partial_trace() {
        // a taxonomy whose core hub service is also a spoke service
        let mut tax = Taxonomy::azure();
        tax.spoke.insert(ServiceId::new("dns"));
        let orch = Orchestrator::new(Arc::new(tax));
        let outcome = orch.execute(&Request::default().with(Category::Compute, ["dns"]));
        assert!(!outcome.success);
        assert_eq!(stages(&outcome.trace), vec![Stage::Hub, Stage::Spoke]);
        let error = outcome.error.unwrap();
        assert!(error.contains("TOPO001"), "{error}");
    }

    #[test]
    fn run_is_deterministic() {
        let req = Request::default()
            .with(Category::Network, ["vpn"])
            .with(Category::Compute, ["aks", "web_apps"]);
        let orch = Orchestrator::default();
        assert_eq!(orch.run(&req), orch.run(&req));
    }
}
