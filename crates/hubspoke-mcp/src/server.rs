use hubspoke_advisor::{ai_configured, read_settings};
use hubspoke_core::{
    categorize, recommend, validate_service_names, validate_topology, Orchestrator, Request,
    PRINCIPLES,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct TopologyRequest {
    /// Requested services per category (network, security, monitoring, backup_services, compute, database, storage, ai, analytics, integration) plus preferences: scalability ("low", "medium", "high", "elastic"), security_posture ("standard", "zero_trust"), backup ("basic", "comprehensive"). The legacy "<category>_services" keys are accepted too.
    request: Request,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct NormalizeRequest {
    /// Raw service names, e.g. ["Azure Firewall", "webapp", "k8s"]
    names: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RecommendRequest {
    /// Free-text description of the workload, e.g. "REST API with a Redis cache and nightly reporting"
    description: String,
}

#[derive(Debug, Serialize)]
struct NormalizedName {
    raw: String,
    id: String,
    membership: hubspoke_core::Membership,
}

// --- Tool bodies ---

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("serialization error: {e}"))
}

pub fn synthesize_json(orch: &Orchestrator, request: &Request) -> Result<String, String> {
    let outcome = orch.execute(request);
    match (&outcome.topology, outcome.success) {
        (Some(topology), true) => to_json(topology),
        _ => Err(to_json(&outcome)?),
    }
}

pub fn classify_json(orch: &Orchestrator, request: &Request) -> Result<String, String> {
    request.check_limits().map_err(|e| e.to_string())?;
    to_json(&orch.classifier().classify(request))
}

pub fn normalize_json(orch: &Orchestrator, names: &[String]) -> Result<String, String> {
    let tax = orch.taxonomy();
    let rows: Vec<NormalizedName> = names
        .iter()
        .map(|raw| {
            let id = tax.normalize(raw);
            NormalizedName {
                raw: raw.clone(),
                membership: tax.membership(id.as_str()),
                id: id.to_string(),
            }
        })
        .collect();
    to_json(&serde_json::json!({
        "names": rows,
        "split": categorize(names, tax),
    }))
}

pub fn validate_json(orch: &Orchestrator, request: &Request) -> Result<String, String> {
    request.check_limits().map_err(|e| e.to_string())?;
    let topology = orch.run(request);
    let report = validate_topology(&topology, orch.taxonomy());
    to_json(&report)
}

pub fn service_names_json(orch: &Orchestrator, request: &Request) -> Result<String, String> {
    request.check_limits().map_err(|e| e.to_string())?;
    to_json(&validate_service_names(request, orch.taxonomy()))
}

fn reply(result: Result<String, String>) -> Result<CallToolResult, McpError> {
    Ok(match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(text) => CallToolResult::error(vec![Content::text(text)]),
    })
}

// --- Server ---

const INSTRUCTIONS: &str = r#"Hub-spoke topology synthesis for Azure landing zones.

Give it the services a workload needs, grouped by category, and it splits them into shared hub services and workload spoke services, derives the hub VNet and two workload spokes (production, development) with their subnets, and returns one merged topology with connectivity rules.

Service names are normalized (case, "azure_" prefixes, common aliases like "vm" or "k8s"). Names that match neither side are reported under `unclassified`, never guessed.

Call `get_principles` for the placement rules before reviewing or editing a topology by hand."#;

#[derive(Clone)]
pub struct HubSpokeServer {
    orchestrator: Arc<Orchestrator>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl HubSpokeServer {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Synthesize the merged hub-spoke topology for a request. Returns {hub: {services, network, infrastructure, security}, spokes: {services, workloads: {production_spoke, development_spoke}, data_flow, dependencies, scaling}, connectivity, architecture_pattern, unclassified, summary, trace}. On failure returns {success: false, error, trace} with the stages that completed."
    )]
    fn synthesize_topology(
        &self,
        Parameters(req): Parameters<TopologyRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(synthesize_json(&self.orchestrator, &req.request))
    }

    #[tool(
        description = "Split a request into hub and spoke service ids without building the topology. Returns {hub, spoke, unclassified}; the core hub services (azure_firewall, bastion, dns) are always included."
    )]
    fn classify_services(
        &self,
        Parameters(req): Parameters<TopologyRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(classify_json(&self.orchestrator, &req.request))
    }

    #[tool(
        description = "Normalize raw service names to canonical ids and show hub/spoke membership for each, plus a flat {hub, spoke, uncategorized} split."
    )]
    fn normalize_services(
        &self,
        Parameters(req): Parameters<NormalizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(normalize_json(&self.orchestrator, &req.names))
    }

    #[tool(
        description = "Synthesize the topology for a request and validate it: service overlap, core hub services, address-space and subnet overlap, peering, scaling bounds, zero-trust identity. Returns {passed, issues: [{rule_id, severity, resource, message, recommendation}], summary, compliance_score}."
    )]
    fn validate_topology(
        &self,
        Parameters(req): Parameters<TopologyRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(validate_json(&self.orchestrator, &req.request))
    }

    #[tool(
        description = "Check every requested service name against the catalog of its category. Returns per category {normalized, invalid, suggestions}."
    )]
    fn validate_service_names(
        &self,
        Parameters(req): Parameters<TopologyRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(service_names_json(&self.orchestrator, &req.request))
    }

    #[tool(
        description = "Recommend services per category from a free-text description using keyword matching. virtual_network is always included."
    )]
    fn recommend_services(
        &self,
        Parameters(req): Parameters<RecommendRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(to_json(&recommend(&req.description)))
    }

    #[tool(description = "Get the active service taxonomy: hub set, spoke set, aliases, core hub services and tier tables")]
    fn get_taxonomy(&self) -> Result<CallToolResult, McpError> {
        reply(to_json(self.orchestrator.taxonomy()))
    }

    #[tool(description = "Get the hub-spoke placement principles that topologies follow")]
    fn get_principles(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(PRINCIPLES)]))
    }

    #[tool(
        description = "Ask the configured AI provider to review the synthesized topology. Returns [{target, message, severity}]. Requires provider, model and API key in ~/.hubspoke/settings.json (no key needed for ollama)."
    )]
    async fn review_topology(
        &self,
        Parameters(req): Parameters<TopologyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let settings = read_settings();
        if !ai_configured(&settings) {
            return reply(Err(
                "AI review is not configured. Set provider, model and apiKey in ~/.hubspoke/settings.json."
                    .to_string(),
            ));
        }
        if let Err(e) = req.request.check_limits() {
            return reply(Err(e.to_string()));
        }
        let topology = self.orchestrator.run(&req.request);
        let hints = hubspoke_advisor::review(&topology, &settings).await;
        debug!(count = hints.len(), "review finished");
        reply(to_json(&hints))
    }
}

#[tool_handler]
impl ServerHandler for HubSpokeServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!("{INSTRUCTIONS}\n\n## Hub-spoke principles\n{PRINCIPLES}");
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubspoke_core::Category;

    fn orch() -> Orchestrator {
        Orchestrator::default()
    }

    #[test]
    fn synthesize_returns_topology_json() {
        let req = Request::default().with(Category::Compute, ["vm"]);
        let text = synthesize_json(&orch(), &req).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["architecture_pattern"], "hub_and_spoke");
        assert_eq!(json["spokes"]["services"], serde_json::json!(["virtual_machines"]));
    }

    #[test]
    fn synthesize_failure_carries_outcome() {
        let many: Vec<String> = (0..60).map(|i| format!("s{i}")).collect();
        let req = Request::default().with(Category::Ai, many);
        let text = synthesize_json(&orch(), &req).unwrap_err();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("too many services"));
        assert_eq!(json["trace"], serde_json::json!([]));
    }

    #[test]
    fn classify_reports_unclassified() {
        let req = Request::default().with(Category::Compute, ["aks", "mainframe"]);
        let json: serde_json::Value =
            serde_json::from_str(&classify_json(&orch(), &req).unwrap()).unwrap();
        assert_eq!(json["spoke"], serde_json::json!(["aks"]));
        assert_eq!(json["unclassified"], serde_json::json!(["mainframe"]));
        assert_eq!(json["hub"], serde_json::json!(["azure_firewall", "bastion", "dns"]));
    }

    #[test]
    fn normalize_shows_membership() {
        let names = vec!["Key Vault".to_string(), "k8s".to_string()];
        let json: serde_json::Value =
            serde_json::from_str(&normalize_json(&orch(), &names).unwrap()).unwrap();
        assert_eq!(json["names"][0]["id"], "key_vault");
        assert_eq!(json["names"][0]["membership"], "both");
        assert_eq!(json["names"][1]["id"], "aks");
        assert_eq!(json["split"]["spoke"], serde_json::json!(["key_vault", "aks"]));
    }

    #[test]
    fn validate_report_passes_for_plain_request() {
        let req = Request::default().with(Category::Compute, ["app_services"]);
        let json: serde_json::Value =
            serde_json::from_str(&validate_json(&orch(), &req).unwrap()).unwrap();
        assert_eq!(json["passed"], true);
        assert_eq!(json["compliance_score"], 100.0);
    }

    #[test]
    fn service_names_flags_typos() {
        let req = Request::default().with(Category::Database, ["sql", "cosmoss"]);
        let json: serde_json::Value =
            serde_json::from_str(&service_names_json(&orch(), &req).unwrap()).unwrap();
        assert_eq!(json["categories"]["database"]["normalized"], serde_json::json!(["sql_database"]));
        assert_eq!(json["categories"]["database"]["invalid"], serde_json::json!(["cosmoss"]));
    }

    #[test]
    fn tool_params_accept_legacy_keys() {
        let req: TopologyRequest = serde_json::from_value(serde_json::json!({
            "request": {"compute_services": ["vm"], "scalability": "moderate"}
        }))
        .unwrap();
        assert_eq!(req.request.compute, vec!["vm"]);
    }
}
