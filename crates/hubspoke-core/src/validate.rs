//! Light structural validation of a merged topology.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cidr::Cidr;
use crate::error::{Error, Result};
use crate::pipeline::MergedTopology;
use crate::taxonomy::{Taxonomy, DUAL_CONTEXT_SERVICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Score deduction per issue.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::High => 10,
            Severity::Medium => 5,
            Severity::Low => 2,
            Severity::Info => 1,
        }
    }

    /// Critical and high issues fail the report.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub rule_id: String,
    pub severity: Severity,
    /// Service id, VNet or spoke key the issue is about.
    pub resource: String,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub issues: Vec<Issue>,
    pub summary: SeverityCounts,
    pub compliance_score: f64,
}

struct Checker {
    issues: Vec<Issue>,
}

impl Checker {
    fn flag(
        &mut self,
        rule_id: &str,
        severity: Severity,
        resource: impl Into<String>,
        message: String,
        recommendation: &str,
    ) {
        let resource = resource.into();
        if severity.is_blocking() {
            warn!(rule = rule_id, %resource, "{message}");
        }
        self.issues.push(Issue {
            rule_id: rule_id.to_string(),
            severity,
            resource,
            message,
            recommendation: recommendation.to_string(),
        });
    }
}

pub fn validate_topology(topology: &MergedTopology, taxonomy: &Taxonomy) -> ValidationReport {
    let mut c = Checker { issues: Vec::new() };
    let hub = &topology.hub;
    let spokes = &topology.spokes;

    for id in &hub.services {
        if id.as_str() != DUAL_CONTEXT_SERVICE && spokes.services.contains(id.as_str()) {
            c.flag(
                "TOPO001",
                Severity::Critical,
                id.as_str(),
                format!("'{id}' is placed in both the hub and the spokes"),
                "Keep shared services in the hub only; only key_vault may exist in both",
            );
        }
    }

    for id in &taxonomy.core_hub {
        if !hub.services.contains(id.as_str()) {
            c.flag(
                "TOPO002",
                Severity::High,
                id.as_str(),
                format!("core hub service '{id}' is missing"),
                "Every hub needs its firewall, bastion and DNS baseline",
            );
        }
    }

    let mut vnets: Vec<(&str, Cidr)> = vec![(
        hub.network.hub_vnet.name.as_str(),
        hub.network.hub_vnet.address_space,
    )];
    vnets.extend(
        spokes
            .workloads
            .values()
            .map(|w| (w.vnet.name.as_str(), w.vnet.address_space)),
    );
    for (i, (a_name, a)) in vnets.iter().enumerate() {
        for (b_name, b) in &vnets[i + 1..] {
            if a.overlaps(b) {
                c.flag(
                    "TOPO003",
                    Severity::Critical,
                    *a_name,
                    format!("{a_name} ({a}) overlaps {b_name} ({b})"),
                    "Give every VNet a disjoint address space",
                );
            }
        }
    }

    let all_vnets = std::iter::once(&hub.network.hub_vnet).chain(spokes.workloads.values().map(|w| &w.vnet));
    for vnet in all_vnets {
        let subnets: Vec<(&String, &Cidr)> = vnet.subnets.iter().collect();
        for (i, (name, cidr)) in subnets.iter().enumerate() {
            if !vnet.address_space.contains(cidr) {
                c.flag(
                    "TOPO004",
                    Severity::Critical,
                    vnet.name.as_str(),
                    format!("subnet {name} ({cidr}) lies outside {} ({})", vnet.name, vnet.address_space),
                    "Allocate subnets from the VNet's own address space",
                );
            }
            for (other, other_cidr) in &subnets[i + 1..] {
                if cidr.overlaps(other_cidr) {
                    c.flag(
                        "TOPO004",
                        Severity::Critical,
                        vnet.name.as_str(),
                        format!("subnets {name} ({cidr}) and {other} ({other_cidr}) overlap in {}", vnet.name),
                        "Allocate non-overlapping subnet blocks",
                    );
                }
            }
        }
    }

    for (key, spoke) in &spokes.workloads {
        if !spoke.peering_to_hub {
            c.flag(
                "TOPO005",
                Severity::High,
                key.as_str(),
                format!("{key} is not peered to the hub"),
                "Peer every spoke to the hub; spokes never route directly",
            );
        }
        if !spokes.services.is_empty() && spoke.vnet.subnets.is_empty() {
            c.flag(
                "TOPO006",
                Severity::Medium,
                key.as_str(),
                format!("{key} hosts services but has no subnets"),
                "Add a web, app, data or container tier service so a subnet is allocated",
            );
        }
    }

    let policies = &spokes.scaling.scaling_policies;
    if spokes.scaling.auto_scaling && policies.min_instances > policies.max_instances {
        c.flag(
            "TOPO007",
            Severity::Medium,
            "scaling_configuration",
            format!(
                "min_instances {} exceeds max_instances {}",
                policies.min_instances, policies.max_instances
            ),
            "Set min_instances at or below max_instances",
        );
    }

    if hub.security.identity_security.zero_trust
        && !hub.infrastructure.identity_services.privileged_identity_management
    {
        c.flag(
            "TOPO008",
            Severity::Low,
            "privileged_identity_management",
            "zero-trust posture without privileged identity management".to_string(),
            "Enable PIM for just-in-time admin access",
        );
    }

    if !topology.unclassified.is_empty() {
        let ids: Vec<&str> = topology.unclassified.iter().map(|s| s.as_str()).collect();
        c.flag(
            "TOPO009",
            Severity::Info,
            "unclassified",
            format!("identifiers placed in neither hub nor spoke: {}", ids.join(", ")),
            "Check the spelling or the category these services were listed under",
        );
    }

    let resources = hub.services.len() + spokes.services.len();
    report(c.issues, resources)
}

fn report(issues: Vec<Issue>, resources: usize) -> ValidationReport {
    let mut summary = SeverityCounts::default();
    for issue in &issues {
        match issue.severity {
            Severity::Critical => summary.critical += 1,
            Severity::High => summary.high += 1,
            Severity::Medium => summary.medium += 1,
            Severity::Low => summary.low += 1,
            Severity::Info => summary.info += 1,
        }
    }

    ValidationReport {
        passed: !issues.iter().any(|i| i.severity.is_blocking()),
        compliance_score: compliance_score(&issues, resources),
        summary,
        issues,
    }
}

/// 100 minus the weighted deductions as a share of the worst case
/// (one critical per resource), rounded to one decimal.
pub fn compliance_score(issues: &[Issue], resources: usize) -> f64 {
    if resources == 0 {
        return 100.0;
    }
    let deductions: u32 = issues.iter().map(|i| i.severity.weight()).sum();
    let max = resources as f64 * f64::from(Severity::Critical.weight());
    let score = (100.0 - f64::from(deductions) / max * 100.0).max(0.0);
    (score * 10.0).round() / 10.0
}

/// Fails on the first critical or high issue.
pub fn check_invariants(topology: &MergedTopology, taxonomy: &Taxonomy) -> Result<()> {
    let report = validate_topology(topology, taxonomy);
    match report.issues.into_iter().find(|i| i.severity.is_blocking()) {
        Some(issue) => Err(Error::InvariantViolated {
            rule_id: issue.rule_id,
            message: issue.message,
        }),
        None => Ok(()),
    }
}
