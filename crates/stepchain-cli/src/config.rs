use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stepchain_core::EngineConfig;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Bank snapshot to load at startup
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stepchain")
        .join("config.toml")
}

pub fn load_config() -> AppConfig {
    let path = config_path();
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| parse_config(&s))
        .unwrap_or_default()
}

fn parse_config(s: &str) -> Option<AppConfig> {
    toml::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config("[engine]\nlook_ahead_ms = 80\n\n[session]\npath = \"/tmp/set.json\"\n").unwrap();
        assert_eq!(config.engine.look_ahead_ms, 80);
        assert_eq!(config.engine.poll_interval_ms, 25);
        assert_eq!(config.session.path, Some(PathBuf::from("/tmp/set.json")));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.session.path.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(parse_config("[engine]\nlook_ahead_ms = \"soon\"").is_none());
    }
}
