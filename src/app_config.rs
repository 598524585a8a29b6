/*!
 * Application configuration.
 *
 * Handles loading, validating, and saving configuration settings. CLI
 * options override file settings, and the provider API key falls back to
 * the `OPENAI_API_KEY` environment variable when the config leaves it
 * empty.
 */

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language name (e.g. "English")
    pub source_language: String,

    /// Target language name (e.g. "Serbian")
    pub target_language: String,

    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Model name for text pages
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Vision-capable model name for image pages
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// API key; when empty, `OPENAI_API_KEY` from the environment is used
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL; empty selects the public OpenAI endpoint
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Pipeline execution settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Number of parallel workers; 1 selects sequential mode
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Courtesy delay between pages in sequential mode, in milliseconds
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,

    /// Maximum retry attempts after the first failure of a provider call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Multiplier applied to the retry delay after each attempt
    #[serde(default = "default_retry_backoff_factor")]
    pub retry_backoff_factor: f64,
}

/// Log level for application logging
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

fn default_text_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_workers() -> usize {
    3
}

fn default_sleep_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    1000
}

fn default_retry_backoff_factor() -> f64 {
    2.0
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            sleep_ms: default_sleep_ms(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_backoff_factor: default_retry_backoff_factor(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "English".to_string(),
            target_language: "Serbian".to_string(),
            provider: ProviderConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))
    }

    /// Resolve the API key from the config or the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if !self.provider.api_key.is_empty() {
            return Ok(self.provider.api_key.clone());
        }
        std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("No API key: set provider.api_key or the OPENAI_API_KEY environment variable"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language cannot be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language cannot be empty"));
        }
        if self.provider.text_model.trim().is_empty() {
            return Err(anyhow!("Text model cannot be empty"));
        }
        if self.provider.vision_model.trim().is_empty() {
            return Err(anyhow!("Vision model cannot be empty"));
        }
        if self.pipeline.workers == 0 {
            return Err(anyhow!("Worker count must be at least 1"));
        }
        if self.pipeline.retry_backoff_factor < 1.0 {
            return Err(anyhow!("Retry backoff factor must be at least 1.0"));
        }
        Ok(())
    }
}
