//! Configuration loading, validation, and management for crewflow.
//!
//! Loads configuration from `~/.crewflow/config.toml` with environment
//! variable overrides. Validates all settings at startup. Crew definitions
//! live in their own TOML files, see [`manifest`].

pub mod manifest;

pub use manifest::{AgentManifest, CrewManifest};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.crewflow/config.toml`.
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

    /// Loop budgets and self-critique settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Crew execution settings
    #[serde(default)]
    pub crew: CrewSettings,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

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
            .field("crew", &self.crew)
            .field("logging", &self.logging)
            .field("providers", &self.providers)
            .finish()
    }
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Round budget of the ReAct loop
    #[serde(default = "default_budget")]
    pub max_rounds: usize,

    /// Cycle budget of the self-critique loop
    #[serde(default = "default_budget")]
    pub max_cycles: usize,

    /// Capacity of each self-critique history, pinned entry included
    #[serde(default = "default_history_length")]
    pub history_length: usize,

    /// Substring in the critique that ends the self-critique loop
    #[serde(default = "default_stop_token")]
    pub stop_token: String,
}

fn default_budget() -> usize {
    10
}
fn default_history_length() -> usize {
    3
}
fn default_stop_token() -> String {
    "<SATISFIED>".into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_budget(),
            max_cycles: default_budget(),
            history_length: default_history_length(),
            stop_token: default_stop_token(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewSettings {
    /// Run independent branches of the crew graph concurrently
    #[serde(default)]
    pub concurrent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
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

impl AppConfig {
    /// Load configuration from the default path (~/.crewflow/config.toml).
    ///
    /// Also checks environment variables, see [`AppConfig::apply_env`].
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
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

    /// Apply environment variable overrides.
    ///
    /// API key lookup, when none is configured:
    /// - `CREWFLOW_API_KEY` (highest priority)
    /// - `GROQ_API_KEY`
    /// - `OPENAI_API_KEY`
    ///
    /// `CREWFLOW_PROVIDER` and `CREWFLOW_MODEL` override the defaults.
    pub fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("CREWFLOW_API_KEY")
                .ok()
                .or_else(|| std::env::var("GROQ_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("CREWFLOW_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("CREWFLOW_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".crewflow")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_rounds == 0 {
            return Err(ConfigError::ValidationError("agent.max_rounds must be > 0".into()));
        }

        if self.agent.max_cycles == 0 {
            return Err(ConfigError::ValidationError("agent.max_cycles must be > 0".into()));
        }

        if self.agent.history_length == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_length must be > 0".into(),
            ));
        }

        if self.agent.stop_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.stop_token must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
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
            agent: AgentSettings::default(),
            crew: CrewSettings::default(),
            logging: LoggingConfig::default(),
            providers: HashMap::new(),
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
