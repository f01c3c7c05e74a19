use hubspoke_core::pipeline::MergedTopology;
use hubspoke_core::service::ServiceSet;
use hubspoke_core::spoke::TierServices;
use hubspoke_core::PRINCIPLES;
use serde::Serialize;

/// Wire name of a unit enum value, e.g. `via_hub_firewall`.
fn wire<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| "?".to_string())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn push_ids(out: &mut String, label: &str, ids: &ServiceSet, indent: &str) {
    if ids.is_empty() {
        return;
    }
    out.push_str(indent);
    out.push_str(label);
    out.push_str(": ");
    let joined: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
    out.push_str(&joined.join(", "));
    out.push('\n');
}

fn push_tiers(out: &mut String, tiers: &TierServices) {
    let rows = [
        ("web_tier", &tiers.web_tier),
        ("application_tier", &tiers.application_tier),
        ("data_tier", &tiers.data_tier),
        ("integration_tier", &tiers.integration_tier),
    ];
    for (label, ids) in rows {
        if ids.is_empty() {
            continue;
        }
        let joined: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        out.push_str("    ");
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&joined.join(", "));
        out.push('\n');
    }
}

/// Compact text rendering of a topology for LLM consumption.
pub fn serialize_topology(topology: &MergedTopology) -> String {
    let mut out = String::with_capacity(2048);
    let hub = &topology.hub;
    let vnet = &hub.network.hub_vnet;
    let gateway = &hub.network.gateway_config;

    out.push_str("HUB ");
    out.push_str(&vnet.name);
    out.push(' ');
    out.push_str(&vnet.address_space.to_string());
    out.push_str(" gateway=");
    out.push_str(&wire(&gateway.kind));
    if let Some(sku) = &gateway.sku {
        out.push('(');
        out.push_str(sku);
        out.push(')');
    }
    out.push('\n');
    push_ids(&mut out, "services", &hub.services, "  ");
    for (name, cidr) in &vnet.subnets {
        out.push_str(&format!("  subnet {name}={cidr}\n"));
    }
    out.push_str(&format!(
        "  shared: pim={} sentinel={} site_recovery={} zero_trust={}\n",
        on_off(hub.infrastructure.identity_services.privileged_identity_management),
        on_off(hub.infrastructure.monitoring_services.azure_sentinel),
        on_off(hub.infrastructure.backup_services.site_recovery),
        on_off(hub.security.identity_security.zero_trust),
    ));

    let spokes = &topology.spokes;
    out.push_str("SPOKES:\n");
    push_ids(&mut out, "services", &spokes.services, "  ");
    for (key, spoke) in &spokes.workloads {
        out.push_str(&format!(
            "  {key} \"{}\" {} peered={}\n",
            spoke.vnet.name,
            spoke.vnet.address_space,
            if spoke.peering_to_hub { "yes" } else { "no" }
        ));
        for (name, cidr) in &spoke.vnet.subnets {
            out.push_str(&format!("    subnet {name}={cidr}\n"));
        }
        push_tiers(&mut out, &spoke.services);
    }
    let policies = &spokes.scaling.scaling_policies;
    out.push_str(&format!(
        "  scaling: auto={} min={} max={}\n",
        on_off(spokes.scaling.auto_scaling),
        policies.min_instances,
        policies.max_instances
    ));

    if !topology.unclassified.is_empty() {
        push_ids(&mut out, "UNCLASSIFIED", &topology.unclassified, "");
    }

    let c = &topology.connectivity;
    out.push_str("CONNECTIVITY:\n");
    out.push_str(&format!(
        "  hub_to_spoke={} spoke_to_spoke={} internet={} on_premises={}\n",
        wire(&c.hub_to_spoke_connectivity),
        wire(&c.spoke_to_spoke_connectivity),
        wire(&c.internet_connectivity),
        wire(&c.on_premises_connectivity),
    ));

    out
}

pub fn system_prompt() -> String {
    format!(
        "You are an Azure landing zone advisor. Review hub-spoke topologies for architectural quality: \
service placement, network layout and missing shared infrastructure.\n\n\
Focus on:\n\
- Workload services that look misplaced, or shared services a workload clearly needs but the hub lacks \
(e.g. a public web tier with no application gateway or WAF)\n\
- Spokes with services but no matching tier subnet\n\
- Unclassified identifiers: suggest the canonical service the author most likely meant\n\
- Data tiers reachable without private endpoints, or integration services without a queue\n\
- Missing continuity: production workloads with basic backup only\n\
- Suggest specific services by name, not generic advice\n\n\
Do NOT:\n\
- Question the fixed address plan or the two-spoke layout\n\
- Suggest direct spoke-to-spoke peering or direct internet egress from a spoke\n\
- Give generic advice (\"consider scaling\", \"think about security\")\n\n\
Output ONLY a JSON array. \
Each item: {{\"target\":\"<service id or spoke name>\",\"msg\":\"<suggestion>\",\"sev\":\"i\"|\"w\"}}. \
Use a service id from the topology (e.g. \"sql_database\") or a spoke name (e.g. \"production_spoke\") as target. \
Use \"w\" only for clear violations of the principles below. Use \"i\" for constructive suggestions. \
If nothing to suggest, output [].\n\n\
## Hub-spoke principles\n{}\n\n\
Output ONLY the JSON array, nothing else.",
        PRINCIPLES
    )
}

pub fn user_message(topology: &MergedTopology) -> String {
    serialize_topology(topology)
}
