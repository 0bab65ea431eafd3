use std::path::PathBuf;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "change-of-address.yaml";

/// Runtime configuration.
///
/// Layered as: built-in defaults, then the YAML file (`COA_CONFIG` or
/// `change-of-address.yaml` when present), then `COA_*` environment
/// variables (`COA_AI__MODEL=...` for nested keys). `GEMINI_API_KEY` is
/// honoured as a fallback for `ai.api_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Settings for the text-completion service behind service suggestions.
/// No `api_key` means suggestions are unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load from the default locations described on [`Config`].
    pub fn load() -> Result<Self> {
        let file = std::env::var("COA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_figment(Self::figment(&file))
    }

    pub fn figment(file: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed("COA_").split("__").ignore(&["config"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: Config = figment.extract().context("Invalid configuration")?;

        if config.ai.api_key.as_deref().map_or(true, str::is_empty) {
            config.ai.api_key = std::env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.server.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.ai.model, "gemini-pro");
        assert_eq!(config.ai.timeout_secs, 30);
        assert!(config.ai.api_key.is_none());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "coa.yaml",
                "data_dir: /var/lib/coa\nai:\n  api_key: secret\n  model: gemini-1.5-flash\n",
            )?;

            let config = Config::from_figment(Config::figment("coa.yaml")).unwrap();
            assert_eq!(config.data_dir, PathBuf::from("/var/lib/coa"));
            assert_eq!(config.ai.api_key.as_deref(), Some("secret"));
            assert_eq!(config.ai.model, "gemini-1.5-flash");
            assert_eq!(config.server.bind_addr, "0.0.0.0:5000");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml_and_gemini_key_fallback() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("coa.yaml", "server:\n  bind_addr: 127.0.0.1:8080\n")?;
            jail.set_env("COA_SERVER__BIND_ADDR", "127.0.0.1:9090");
            jail.set_env("GEMINI_API_KEY", "from-env");

            let config = Config::from_figment(Config::figment("coa.yaml")).unwrap();
            assert_eq!(config.server.bind_addr, "127.0.0.1:9090");
            assert_eq!(config.ai.api_key.as_deref(), Some("from-env"));
            Ok(())
        });
    }
}
