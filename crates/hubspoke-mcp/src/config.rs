use hubspoke_core::Taxonomy;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const TAXONOMY_FILE: &str = "taxonomy.json";

/// Load `taxonomy.json` from `dir`, falling back to the built-in Azure
/// taxonomy when the file is absent or unreadable.
pub fn load_taxonomy(dir: &Path) -> Taxonomy {
    let path = dir.join(TAXONOMY_FILE);
    if !path.exists() {
        return Taxonomy::azure();
    }

    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Taxonomy>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(taxonomy) => {
            let overlap = taxonomy.unexpected_overlap();
            if !overlap.is_empty() {
                let ids: Vec<&str> = overlap.iter().map(|s| s.as_str()).collect();
                warn!(ids = %ids.join(", "), "taxonomy override places services on both sides");
            }
            info!(
                path = %path.display(),
                hub = taxonomy.hub.len(),
                spoke = taxonomy.spoke.len(),
                "loaded taxonomy override"
            );
            taxonomy
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed taxonomy override");
            Taxonomy::azure()
        }
    }
}
