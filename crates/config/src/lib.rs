//! Configuration loading, validation, and management for thoughtline.
//!
//! Loads configuration from `~/.thoughtline/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.thoughtline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// MCP servers whose tools are exposed to the agent
    #[serde(default)]
    pub mcp_servers: Vec<McpServerConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("providers", &self.providers)
            .field("mcp_servers", &self.mcp_servers)
            .finish()
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on loop iterations (and therefore transcript length)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Per-tool-call timeout; unset means tools enforce their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,
}

fn default_max_iterations() -> u32 {
    20
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_secs: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Built-in tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Action types of the built-in tools to register
    #[serde(default = "default_enabled_tools")]
    pub enabled: Vec<String>,

    /// Maximum results returned by the `search` tool
    #[serde(default = "default_search_max_results")]
    pub search_max_results: usize,

    /// Ares live-search settings
    #[serde(default)]
    pub ares: AresConfig,
}

fn default_enabled_tools() -> Vec<String> {
    vec![
        "calculate".into(),
        "search".into(),
        "ares_internet_search".into(),
        "request_user_input".into(),
    ]
}
fn default_search_max_results() -> usize {
    5
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_tools(),
            search_max_results: default_search_max_results(),
            ares: AresConfig::default(),
        }
    }
}

impl ToolsConfig {
    pub fn is_enabled(&self, action_type: &str) -> bool {
        self.enabled.iter().any(|t| t == action_type)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AresConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_ares_url")]
    pub api_url: String,
}

fn default_ares_url() -> String {
    "https://api-ares.traversaal.ai/live/predict".into()
}

impl Default for AresConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_ares_url(),
        }
    }
}

impl std::fmt::Debug for AresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AresConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// A stdio MCP server to launch at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Server id, used in action types as `mcp:<id>:<tool>`
    pub id: String,

    /// Program to spawn
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl AppConfig {
    /// Load configuration from the default path (~/.thoughtline/config.toml).
    ///
    /// Environment variables override the file:
    /// - `THOUGHTLINE_API_KEY` (highest priority), `OPENROUTER_API_KEY`, `OPENAI_API_KEY`
    /// - `THOUGHTLINE_PROVIDER`, `THOUGHTLINE_MODEL`
    /// - `ARES_API_KEY` / `TRAVERSAAL_ARES_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup function.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("THOUGHTLINE_API_KEY")
                .or_else(|| lookup("OPENROUTER_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("THOUGHTLINE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("THOUGHTLINE_MODEL") {
            self.default_model = model;
        }

        if self.tools.ares.api_key.is_none() {
            self.tools.ares.api_key =
                lookup("ARES_API_KEY").or_else(|| lookup("TRAVERSAAL_ARES_API_KEY"));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".thoughtline")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for server in &self.mcp_servers {
            if server.id.is_empty() || server.id.contains(':') {
                return Err(ConfigError::ValidationError(format!(
                    "mcp server id '{}' must be non-empty and must not contain ':'",
                    server.id
                )));
            }
            if !seen.insert(server.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate mcp server id '{}'",
                    server.id
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            providers: HashMap::new(),
            mcp_servers: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
