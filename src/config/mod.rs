//! Configuration management for prompt_optimizer
//!
//! Supports configuration via:
//! 1. Config file (~/.config/prompt-optimizer/config.toml)
//! 2. Environment variables (PROMPT_OPTIMIZER_API_KEY, PROMPT_OPTIMIZER_BASE_URL, ...)
//! 3. CLI arguments (override file/env settings)

use crate::gateway::{GatewayConfig, DEFAULT_BASE_URL};
use crate::optimization::{CounterKind, UnknownModelPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_API_KEY: &str = "PROMPT_OPTIMIZER_API_KEY";
pub const ENV_BASE_URL: &str = "PROMPT_OPTIMIZER_BASE_URL";
pub const ENV_MODEL: &str = "PROMPT_OPTIMIZER_MODEL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compression API settings
    pub gateway: GatewaySettings,

    /// Guide optimization settings
    pub optimization: OptimizationSettings,

    /// Defaults applied to new sessions
    pub session: SessionSettings,
}

/// Compression API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// API key (can also use PROMPT_OPTIMIZER_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; `/compress` is appended
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after transient failures
    pub max_retries: u32,

    /// Backoff step between retries in milliseconds
    pub retry_backoff_ms: u64,

    /// Compression rate used when none is given
    pub default_rate: f64,

    /// Whether the gateway is enabled
    pub enabled: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 250,
            default_rate: 0.5,
            enabled: true,
        }
    }
}

/// Guide optimization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationSettings {
    /// What to do when a model has no guide
    pub unknown_model: UnknownModelPolicy,

    /// Token counter used for before/after figures
    pub token_counter: CounterKind,
}

/// Defaults applied to new sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_style: Option<String>,
}

impl Config {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prompt-optimizer")
            .join("config.toml")
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from specific path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config.with_env_overrides())
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.gateway.api_key = Some(key);
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            self.gateway.base_url = url;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            self.session.default_model = Some(model);
        }

        self
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.gateway.default_rate) {
            return Err(ConfigError::Invalid(format!(
                "gateway.default_rate must be between 0.0 and 1.0 (got {})",
                self.gateway.default_rate
            )));
        }

        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "gateway.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.gateway.enabled && self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.base_url is empty".to_string()));
        }

        Ok(())
    }

    /// Get API key (from config or env)
    pub fn api_key(&self) -> Option<String> {
        self.gateway
            .api_key
            .clone()
            .or_else(|| std::env::var(ENV_API_KEY).ok())
    }

    /// Transport settings for the compression gateway
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            api_key: self.api_key().unwrap_or_default(),
            base_url: self.gateway.base_url.clone(),
            timeout: Duration::from_secs(self.gateway.timeout_secs),
            max_retries: self.gateway.max_retries,
            retry_backoff: Duration::from_millis(self.gateway.retry_backoff_ms),
        }
    }

    /// Set a `section.field` value from its string form
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
            value.parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            })
        }

        match key {
            "gateway.api_key" => self.gateway.api_key = Some(value.to_string()),
            "gateway.base_url" => self.gateway.base_url = value.to_string(),
            "gateway.timeout_secs" => self.gateway.timeout_secs = parse(key, value)?,
            "gateway.max_retries" => self.gateway.max_retries = parse(key, value)?,
            "gateway.retry_backoff_ms" => self.gateway.retry_backoff_ms = parse(key, value)?,
            "gateway.default_rate" => self.gateway.default_rate = parse(key, value)?,
            "gateway.enabled" => self.gateway.enabled = parse(key, value)?,
            "optimization.unknown_model" => {
                self.optimization.unknown_model = parse(key, value)?
            }
            "optimization.token_counter" => {
                self.optimization.token_counter = match value {
                    "tiktoken" => CounterKind::Tiktoken,
                    "whitespace" => CounterKind::Whitespace,
                    "char_estimate" => CounterKind::CharEstimate,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        })
                    }
                }
            }
            "session.default_model" => self.session.default_model = Some(value.to_string()),
            "session.default_style" => self.session.default_style = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        Ok(())
    }

    /// Generate example config content
    pub fn example() -> String {
        let example = Config::default();
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Builder for creating Config programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gateway.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gateway.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.gateway.timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.gateway.max_retries = retries;
        self
    }

    pub fn unknown_model(mut self, policy: UnknownModelPolicy) -> Self {
        self.config.optimization.unknown_model = policy;
        self
    }

    pub fn token_counter(mut self, kind: CounterKind) -> Self {
        self.config.optimization.token_counter = kind;
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.session.default_model = Some(model.into());
        self
    }

    pub fn default_style(mut self, style: impl Into<String>) -> Self {
        self.config.session.default_style = Some(style.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.gateway.default_rate, 0.5);
        assert_eq!(config.optimization.unknown_model, UnknownModelPolicy::Fail);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .api_key("test-key")
            .default_model("claude-3-opus")
            .unknown_model(UnknownModelPolicy::PassThrough)
            .token_counter(CounterKind::Whitespace)
            .build();

        assert_eq!(config.gateway.api_key, Some("test-key".to_string()));
        assert_eq!(config.session.default_model.as_deref(), Some("claude-3-opus"));
        assert_eq!(config.optimization.unknown_model, UnknownModelPolicy::PassThrough);
        assert_eq!(config.gateway_config().api_key, "test-key");
    }

    #[test]
    fn test_example_config() {
        let example = Config::example();
        assert!(example.contains("[gateway]"));
        assert!(example.contains("[optimization]"));
        assert!(example.contains("unknown_model = \"fail\""));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ConfigBuilder::new()
            .timeout_secs(5)
            .max_retries(0)
            .unknown_model(UnknownModelPolicy::Generic)
            .build();
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path).unwrap();
        assert_eq!(loaded.gateway.timeout_secs, 5);
        assert_eq!(loaded.gateway.max_retries, 0);
        assert_eq!(loaded.optimization.unknown_model, UnknownModelPolicy::Generic);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[optimization]\nunknown_model = \"pass-through\"\n").unwrap();

        let loaded = Config::load_from(path).unwrap();
        assert_eq!(loaded.optimization.unknown_model, UnknownModelPolicy::PassThrough);
        assert_eq!(loaded.gateway.timeout_secs, 30);
    }

    #[test]
    fn test_set_field() {
        let mut config = Config::default();
        config.set_field("gateway.default_rate", "0.8").unwrap();
        config.set_field("optimization.unknown_model", "generic").unwrap();
        config.set_field("optimization.token_counter", "char_estimate").unwrap();

        assert_eq!(config.gateway.default_rate, 0.8);
        assert_eq!(config.optimization.unknown_model, UnknownModelPolicy::Generic);
        assert_eq!(config.optimization.token_counter, CounterKind::CharEstimate);

        assert!(matches!(
            config.set_field("gateway.timeout_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set_field("cache.size", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        let mut config = Config::default();
        config.gateway.default_rate = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
