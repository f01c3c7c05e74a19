pub mod engine;
pub mod error;
mod parse;
mod prompt;
pub mod settings;

pub use error::{AdvisorError, Result};
pub use parse::parse_llm_output;
pub use prompt::{serialize_topology, system_prompt};
pub use settings::{ai_configured, read_settings, write_settings, AiSettings};

use hubspoke_core::pipeline::MergedTopology;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    /// Service id or spoke key the hint is about.
    pub target: String,
    pub message: String,
    pub severity: HintSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HintSeverity {
    Info,
    Warning,
}

/// Ask the configured model to review a topology. Returns no hints on failure.
pub async fn review(topology: &MergedTopology, settings: &AiSettings) -> Vec<Hint> {
    let system = prompt::system_prompt();
    let user_msg = prompt::user_message(topology);

    info!(provider = %settings.provider, model = %settings.model, "requesting topology review");

    match engine::generate(settings, &system, &user_msg).await {
        Ok(raw) => {
            tracing::debug!(%raw, "raw LLM output");
            let hints = parse::parse_llm_output(&raw, topology);
            info!(count = hints.len(), "parsed review hints");
            hints
        }
        Err(e) => {
            warn!(error = %e, "topology review failed");
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubspoke_core::{Orchestrator, Request};

    #[tokio::test]
    async fn unknown_provider_yields_no_hints() {
        let topology = Orchestrator::default().run(&Request::default());
        let settings = AiSettings {
            provider: "acme".into(),
            api_key: "k".into(),
            model: "m".into(),
        };
        assert!(review(&topology, &settings).await.is_empty());
    }

    #[test]
    fn hint_wire_format() {
        let hint = Hint {
            target: "sql_database".into(),
            message: "Use private endpoints".into(),
            severity: HintSeverity::Warning,
        };
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["target"], "sql_database");
    }
}
