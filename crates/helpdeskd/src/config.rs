//! Configuration management for helpdeskd.
//!
//! Loads settings from /etc/helpdeskd/config.toml (or the path in
//! HELPDESKD_CONFIG), then lets environment variables override the
//! provider selection and model. API keys come only from the
//! environment, never from the file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/helpdeskd/config.toml";

/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "HELPDESKD_CONFIG";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite database file holding tickets and messages
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory of plain-text policy documents
    #[serde(default = "default_policy_dir")]
    pub policy_dir: String,
}

fn default_bind_addr() -> String {
    // Localhost only; put a reverse proxy in front for anything else
    "127.0.0.1:7810".to_string()
}

fn default_database_path() -> String {
    "helpdesk.db".to_string()
}

fn default_policy_dir() -> String {
    "policies".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: default_database_path(),
            policy_dir: default_policy_dir(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai", "openrouter" or "gemini"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override; each provider has its own default
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL override, mainly for OpenAI-compatible gateways
    #[serde(default)]
    pub base_url: Option<String>,

    /// Timeout for a single completion call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_request_timeout() -> u64 {
    30 // hosted inference, allow for slow generations
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load config from file or defaults, then apply env overrides.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());

        let mut config = Self::load_from_path(&path).unwrap_or_else(|e| {
            warn!("Config not found at {}, using defaults: {}", path, e);
            Config::default()
        });

        config.apply_env();
        config
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    /// Environment variables win over the file for provider selection
    /// and model choice.
    fn apply_env(&mut self) {
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.trim().is_empty() {
                self.llm.provider = provider.trim().to_lowercase();
            }
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.trim().is_empty() {
                self.llm.model = Some(model.trim().to_string());
            }
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.llm.base_url = Some(base_url.trim().to_string());
            }
        }
    }
}
