//! Configuration management for Agentline
//!
//! Handles loading and saving the TOML configuration: the remote endpoint
//! and its access key, the two agent identifiers, and session settings.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::agent::{
    AgentDirectory, AgentKind, DEFAULT_CONVERSATIONAL_AGENT_ID, DEFAULT_SUMMARIZATION_AGENT_ID,
};
use crate::error::{Error, Result};
use crate::session::StaleReplyPolicy;

/// Default remote inference endpoint
pub const DEFAULT_ENDPOINT: &str = "https://agents.example.com/v3/inference/chat/";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,
    /// Agent identifiers
    #[serde(default)]
    pub agents: AgentsConfig,
    /// Session behaviour
    #[serde(default)]
    pub session: SessionSettings,
    /// General application settings
    #[serde(default)]
    pub general: GeneralConfig,
}

impl Config {
    /// Agent directory built from the configured identifiers
    pub fn agent_directory(&self) -> AgentDirectory {
        AgentDirectory::new(
            self.agents.conversational_id.clone(),
            self.agents.summarization_id.clone(),
        )
    }
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL every turn is POSTed to
    pub url: String,
    /// Static access key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for the access key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Header carrying the access key
    pub api_key_header: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_key_env: Some("AGENTLINE_API_KEY".to_string()),
            api_key_header: "x-api-key".to_string(),
            timeout_secs: 60,
        }
    }
}

impl EndpointConfig {
    /// Get the API key, checking environment variable if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Some(key.clone());
        }

        if let Some(env_name) = &self.api_key_env
            && let Ok(key) = std::env::var(env_name)
            && !key.is_empty()
        {
            return Some(key);
        }

        None
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Remote agent identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub conversational_id: String,
    pub summarization_id: String,
    /// Agent selected at startup
    pub default_agent: AgentKind,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            conversational_id: DEFAULT_CONVERSATIONAL_AGENT_ID.to_string(),
            summarization_id: DEFAULT_SUMMARIZATION_AGENT_ID.to_string(),
            default_agent: AgentKind::Conversational,
        }
    }
}

/// Session behaviour settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// What to do with a reply that resolves after a clear
    pub stale_replies: StaleReplyPolicy,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level
    pub log_level: String,
    /// Directory for the log file in interactive mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Configuration manager for loading and saving config
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a config manager with a specific path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self { config_path, config })
    }

    /// Get the default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("agentline").join("config.toml"))
    }

    /// Load configuration from a file
    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Path the configuration is read from and saved to
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&self.config_path, content)?;

        Ok(())
    }

    /// Check if an access key is available
    pub fn has_api_key(&self) -> bool {
        self.config.endpoint.get_api_key().is_some()
    }
}
