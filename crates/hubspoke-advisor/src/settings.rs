use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// Overrides the settings directory.
pub const HOME_ENV: &str = "HUBSPOKE_HOME";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

/// Resolve the settings directory (`$HUBSPOKE_HOME`, else `~/.hubspoke/`).
pub fn home_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hubspoke")
}

pub fn read_settings() -> AiSettings {
    read_settings_from(&home_dir())
}

/// Missing or unreadable settings fall back to defaults.
pub fn read_settings_from(dir: &Path) -> AiSettings {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        return AiSettings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn write_settings(settings: &AiSettings) -> Result<()> {
    write_settings_to(&home_dir(), settings)
}

/// Write through a temp file and rename so readers never see a partial file.
pub fn write_settings_to(dir: &Path, settings: &AiSettings) -> Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = dir.join(format!("{SETTINGS_FILE}.tmp"));
    fs::write(&tmp, json)?;
    fs::rename(&tmp, dir.join(SETTINGS_FILE))?;
    debug!(dir = %dir.display(), "settings written");
    Ok(())
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_settings_from(dir.path()), AiSettings::default());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let settings = AiSettings {
            provider: "anthropic".into(),
            api_key: "sk-test".into(),
            model: "some-model".into(),
        };
        write_settings_to(&nested, &settings).unwrap();
        assert_eq!(read_settings_from(&nested), settings);
        assert!(!nested.join("settings.json.tmp").exists());

        let raw = fs::read_to_string(nested.join("settings.json")).unwrap();
        assert!(raw.contains("\"apiKey\""));
    }

    #[test]
    fn corrupt_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        assert_eq!(read_settings_from(dir.path()), AiSettings::default());
    }

    #[test]
    fn configured_needs_key_unless_ollama() {
        let mut s = AiSettings {
            provider: "openai".into(),
            api_key: String::new(),
            model: "m".into(),
        };
        assert!(!ai_configured(&s));
        s.api_key = "k".into();
        assert!(ai_configured(&s));
        s.provider = "ollama".into();
        s.api_key.clear();
        assert!(ai_configured(&s));
        s.model.clear();
        assert!(!ai_configured(&s));
    }
}
