use std::error::Error;
use std::path::Path;
use tracing::info;

const SERVER_KEY: &str = "hubspoke";

/// Register this binary with the agent tools found on PATH by writing
/// project-scoped config in the current directory.
pub fn init_project() -> Result<(), Box<dyn Error>> {
    let binary_path = std::env::current_exe()?
        .canonicalize()?
        .to_string_lossy()
        .to_string();

    let cwd = std::env::current_dir()?;

    let has_claude = which("claude");
    let has_codex = which("codex");

    if !has_claude && !has_codex {
        return Err("neither `claude` nor `codex` found in PATH; install one, then re-run `hubspoke-mcp init`".into());
    }

    if has_claude {
        init_claude_code(&cwd, &binary_path)?;
    }
    if has_codex {
        init_codex(&cwd, &binary_path)?;
    }

    let tools: Vec<&str> = [
        has_claude.then_some("Claude Code"),
        has_codex.then_some("Codex"),
    ]
    .into_iter()
    .flatten()
    .collect();
    eprintln!("Done. {} will use hubspoke in this project.", tools.join(" and "));

    Ok(())
}

pub fn which(name: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| {
                dir.join(name).is_file() || dir.join(format!("{name}.exe")).is_file()
            })
        })
        .unwrap_or(false)
}

/// Merge a stdio server entry into `.mcp.json`.
pub fn init_claude_code(cwd: &Path, binary_path: &str) -> Result<(), Box<dyn Error>> {
    let mcp_json_path = cwd.join(".mcp.json");
    let mut root: serde_json::Value = if mcp_json_path.exists() {
        let contents = std::fs::read_to_string(&mcp_json_path)?;
        serde_json::from_str(&contents).unwrap_or_else(|_| serde_json::json!({}))
    } else {
        serde_json::json!({})
    };
    if !root.is_object() {
        root = serde_json::json!({});
    }

    if !root.get("mcpServers").is_some_and(|v| v.is_object()) {
        root["mcpServers"] = serde_json::json!({});
    }
    root["mcpServers"][SERVER_KEY] = serde_json::json!({
        "type": "stdio",
        "command": binary_path,
        "args": [],
    });

    std::fs::write(&mcp_json_path, serde_json::to_string_pretty(&root)?)?;
    info!(path = %mcp_json_path.display(), "wrote MCP config");
    Ok(())
}

/// Merge an `[mcp_servers.hubspoke]` table into `.codex/config.toml`.
pub fn init_codex(cwd: &Path, binary_path: &str) -> Result<(), Box<dyn Error>> {
    let codex_dir = cwd.join(".codex");
    let config_toml_path = codex_dir.join("config.toml");

    let mut doc: toml_edit::DocumentMut = if config_toml_path.exists() {
        std::fs::read_to_string(&config_toml_path)?
            .parse()
            .unwrap_or_default()
    } else {
        toml_edit::DocumentMut::new()
    };

    if !doc.contains_table("mcp_servers") {
        doc["mcp_servers"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    let mut server = toml_edit::Table::new();
    server.insert("command", toml_edit::value(binary_path));
    server.insert("args", toml_edit::value(toml_edit::Array::new()));
    doc["mcp_servers"][SERVER_KEY] = toml_edit::Item::Table(server);

    std::fs::create_dir_all(&codex_dir)?;
    std::fs::write(&config_toml_path, doc.to_string())?;
    info!(path = %config_toml_path.display(), "wrote Codex config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_config_keeps_other_servers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".mcp.json"),
            r#"{"mcpServers":{"other":{"command":"x"}}}"#,
        )
        .unwrap();

        init_claude_code(dir.path(), "/usr/bin/hubspoke-mcp").unwrap();

        let raw = std::fs::read_to_string(dir.path().join(".mcp.json")).unwrap();
        let root: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(root["mcpServers"]["other"]["command"], "x");
        assert_eq!(root["mcpServers"]["hubspoke"]["command"], "/usr/bin/hubspoke-mcp");
        assert_eq!(root["mcpServers"]["hubspoke"]["type"], "stdio");
    }

    #[test]
    fn claude_config_recovers_from_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".mcp.json"), "not json").unwrap();
        init_claude_code(dir.path(), "/bin/h").unwrap();
        let raw = std::fs::read_to_string(dir.path().join(".mcp.json")).unwrap();
        assert!(raw.contains("\"hubspoke\""));
    }

    #[test]
    fn codex_config_is_created_and_merged() {
        let dir = tempfile::tempdir().unwrap();
        let codex = dir.path().join(".codex");
        std::fs::create_dir_all(&codex).unwrap();
        std::fs::write(codex.join("config.toml"), "model = \"m\"\n").unwrap();

        init_codex(dir.path(), "/bin/h").unwrap();

        let raw = std::fs::read_to_string(codex.join("config.toml")).unwrap();
        let doc: toml_edit::DocumentMut = raw.parse().unwrap();
        assert_eq!(doc["model"].as_str(), Some("m"));
        assert_eq!(doc["mcp_servers"]["hubspoke"]["command"].as_str(), Some("/bin/h"));
    }

    #[test]
    fn which_misses_nonsense() {
        assert!(!which("definitely-not-a-real-binary-hubspoke"));
    }
}
