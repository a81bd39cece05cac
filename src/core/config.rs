//! Configuration management for insula
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/insula/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use url::Url;

use crate::core::error::{InsulaError, Result};

/// Main configuration for insula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model gateway configuration
    pub gateway: GatewayConfig,
    /// Agent behavior configuration
    pub agent: AgentConfig,
    /// Code sandbox configuration
    pub sandbox: SandboxConfig,
    /// Streaming configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Model gateway (LLM backend) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the chat endpoint (default: http://localhost:11434)
    pub base_url: String,
    /// Model identifier passed on every request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool-dispatch rounds before the run gives up with a
    /// best-effort answer
    /// Default: 3
    pub max_tool_rounds: usize,
    /// Whole-run deadline in seconds
    /// Default: 600
    pub run_timeout_secs: u64,
    /// Tagged sections recognized in streamed responses
    pub section_tags: Vec<String>,
    /// System prompt seeded into each session's memory
    pub system_prompt: Option<String>,
    /// Whether to show debug output
    pub debug: bool,
}

/// External code sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Whether the code runner tool is registered
    pub enabled: bool,
    /// Base URL of the code execution service
    pub base_url: String,
    /// Execution timeout in seconds
    pub timeout_secs: u64,
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Whether to stream responses in real-time
    pub enabled: bool,
    /// Capacity of the progress event channel per run
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            agent: AgentConfig::default(),
            sandbox: SandboxConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("INSULA_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: env::var("INSULA_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 3,
            run_timeout_secs: 600,
            section_tags: vec![
                "calculation_plan".to_string(),
                "parameters_provided".to_string(),
                "parameters_required".to_string(),
                "assumptions".to_string(),
            ],
            system_prompt: None,
            debug: env::var("INSULA_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: env::var("INSULA_SANDBOX_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            base_url: env::var("INSULA_SANDBOX_URL")
                .unwrap_or_else(|_| "http://localhost:8787".to_string()),
            timeout_secs: 60,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: env::var("INSULA_STREAMING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            channel_capacity: 256,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("insula")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        // Try to load from config file
        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(InsulaError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| InsulaError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| InsulaError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the configured endpoints are well-formed URLs
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.gateway.base_url)
            .map_err(|e| InsulaError::config(format!("Invalid gateway URL: {}", e)))?;

        if self.sandbox.enabled {
            Url::parse(&self.sandbox.base_url)
                .map_err(|e| InsulaError::config(format!("Invalid sandbox URL: {}", e)))?;
        }

        if self.agent.section_tags.is_empty() {
            return Err(InsulaError::config("At least one section tag is required"));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| InsulaError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| InsulaError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| InsulaError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Check if a config file exists
    pub fn config_exists() -> bool {
        Self::config_file().exists()
    }

    /// Update the gateway model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.gateway.model = model.into();
    }

    /// Set streaming enabled/disabled
    pub fn set_streaming(&mut self, enabled: bool) {
        self.streaming.enabled = enabled;
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
