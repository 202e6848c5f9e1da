//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatbridge/config.json`) and
//! environment. A missing file means defaults; the relay runs with no config
//! at all.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Relay server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Downstream Rasa server settings.
    #[serde(default)]
    pub rasa: RasaConfig,

    /// Chat page and static asset locations.
    #[serde(default)]
    pub ui: UiConfig,
}

/// Relay bind address and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP and WebSocket (default 8000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// Downstream Rasa server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasaConfig {
    /// Base URL of the Rasa server. Overridden by CHATBRIDGE_RASA_URL env.
    /// When absent, http://localhost:5005 is used.
    pub url: Option<String>,
}

/// Chat page and static asset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    /// HTML document served at `/` (default "index.html").
    #[serde(default = "default_ui_index")]
    pub index: PathBuf,

    /// Directory mounted at `/static` when it exists (default "static").
    #[serde(default = "default_ui_static_dir")]
    pub static_dir: PathBuf,
}

fn default_ui_index() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_ui_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            index: default_ui_index(),
            static_dir: default_ui_static_dir(),
        }
    }
}

/// Resolve the Rasa base URL: env CHATBRIDGE_RASA_URL overrides config.
/// Returns None when neither is set (the client falls back to its default).
pub fn resolve_rasa_url(config: &Config) -> Option<String> {
    std::env::var("CHATBRIDGE_RASA_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .rasa
                .url
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Default config path: CHATBRIDGE_CONFIG_PATH env or ~/.chatbridge/config.json.
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var("CHATBRIDGE_CONFIG_PATH") {
        let t = p.trim();
        if !t.is_empty() {
            return PathBuf::from(t);
        }
    }
    dirs::home_dir()
        .map(|h| h.join(".chatbridge").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Load config from `path` (or the default path). A missing file yields defaults.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    read_config(&path)
}

fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert!(config.rasa.url.is_none());
        assert_eq!(config.ui.index, PathBuf::from("index.html"));
        assert_eq!(config.ui.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn camel_case_fields_parse() {
        let raw = r#"{
            "server": { "port": 9000, "bind": "0.0.0.0" },
            "rasa": { "url": "http://rasa.example:5005" },
            "ui": { "staticDir": "assets" }
        }"#;
        let config: Config = serde_json::from_str(raw).expect("parse");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(resolve_rasa_url(&config).as_deref(), Some("http://rasa.example:5005"));
        assert_eq!(config.ui.static_dir, PathBuf::from("assets"));
    }
}
