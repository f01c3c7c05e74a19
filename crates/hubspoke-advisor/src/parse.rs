use hubspoke_core::pipeline::MergedTopology;

use crate::{Hint, HintSeverity};

#[derive(serde::Deserialize)]
struct LlmHint {
    target: String,
    msg: String,
    sev: Option<String>,
}

/// Parse raw LLM output into hints, resolving each target against the
/// topology. Unresolvable hints are dropped; total parse failure yields none.
pub fn parse_llm_output(raw: &str, topology: &MergedTopology) -> Vec<Hint> {
    let json_str = match extract_json_array(raw) {
        Some(s) => s,
        None => return vec![],
    };

    let llm_hints: Vec<LlmHint> = match serde_json::from_str(json_str) {
        Ok(h) => h,
        Err(_) => parse_objects(json_str),
    };

    let targets = known_targets(topology);
    llm_hints
        .into_iter()
        .filter_map(|lh| {
            let target = resolve_target(&lh.target, &targets)?;
            Some(Hint {
                target,
                message: lh.msg,
                severity: map_severity(lh.sev.as_deref()),
            })
        })
        .collect()
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Salvage well-formed objects from a malformed array.
fn parse_objects(json_str: &str) -> Vec<LlmHint> {
    let trimmed = json_str.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    let mut hints = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (i, ch) in inner.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Ok(hint) = serde_json::from_str::<LlmHint>(&inner[s..=i]) {
                            hints.push(hint);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    hints
}

/// Service ids from both sides, then spoke keys.
fn known_targets(topology: &MergedTopology) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    let ids = topology
        .hub
        .services
        .iter()
        .chain(&topology.spokes.services)
        .chain(&topology.unclassified)
        .map(|id| id.to_string())
        .chain(topology.spokes.workloads.keys().cloned());
    for id in ids {
        if !targets.contains(&id) {
            targets.push(id);
        }
    }
    targets
}

/// Exact, then case-insensitive, then substring either way.
fn resolve_target(name: &str, targets: &[String]) -> Option<String> {
    if let Some(t) = targets.iter().find(|t| t.as_str() == name) {
        return Some(t.clone());
    }

    let name_lower = name.trim().to_lowercase();
    if name_lower.is_empty() {
        return None;
    }

    if let Some(t) = targets.iter().find(|t| t.to_lowercase() == name_lower) {
        return Some(t.clone());
    }

    targets
        .iter()
        .find(|t| {
            let t_lower = t.to_lowercase();
            t_lower.contains(&name_lower) || name_lower.contains(&t_lower)
        })
        .cloned()
}

fn map_severity(s: Option<&str>) -> HintSeverity {
    match s {
        Some("w") => HintSeverity::Warning,
        _ => HintSeverity::Info,
    }
}
