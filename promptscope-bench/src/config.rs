//! Configuration management
//!
//! Loads provider, runner and storage settings from TOML files and provides
//! runtime access.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::{anthropic, gemini, openai};
use crate::runner::ExecutorConfig;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Providers in fan-out order
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Which client implementation serves a provider entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
    Groq,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Environment variable holding the API key by default
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => anthropic::API_KEY_ENV,
            ProviderKind::OpenAI => openai::API_KEY_ENV,
            ProviderKind::Groq => openai::GROQ_API_KEY_ENV,
            ProviderKind::Gemini => gemini::API_KEY_ENV,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Environment variable holding the API key; the kind's default when empty
    #[serde(default)]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub default_model: String,
    /// Requests per minute
    #[serde(default = "default_rpm")]
    pub rpm: u32,
    /// Tokens per minute
    #[serde(default = "default_tpm")]
    pub tpm: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, default_model: impl Into<String>) -> Self {
        Self {
            kind,
            enabled: true,
            api_key_env: kind.default_api_key_env().to_string(),
            base_url: None,
            default_model: default_model.into(),
            rpm: default_rpm(),
            tpm: default_tpm(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// The environment variable to read the key from
    pub fn key_env(&self) -> &str {
        if self.api_key_env.is_empty() {
            self.kind.default_api_key_env()
        } else {
            &self.api_key_env
        }
    }

    /// True when the key variable is set and non-empty
    pub fn has_api_key(&self) -> bool {
        std::env::var(self.key_env()).is_ok_and(|v| !v.is_empty())
    }
}

/// Fan-out execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_parallel_requests")]
    pub parallel_requests: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Token limit for providers without their own `max_tokens`
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Experiment store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_rpm() -> u32 { 60 }
fn default_tpm() -> u32 { 100_000 }
fn default_parallel_requests() -> usize { 4 }
fn default_retry_count() -> u32 { 2 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_max_retry_delay_ms() -> u64 { 30_000 }
fn default_timeout_ms() -> u64 { 60_000 }
fn default_max_tokens() -> u32 { 1024 }
fn default_store_path() -> PathBuf { PathBuf::from("results/experiments.json") }

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel_requests: default_parallel_requests(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl RunnerConfig {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            parallel_requests: self.parallel_requests,
            retry_count: self.retry_count,
            retry_delay_ms: self.retry_delay_ms,
            max_retry_delay_ms: self.max_retry_delay_ms,
            timeout_ms: self.timeout_ms,
            max_tokens: self.max_tokens,
        }
    }
}

/// Paths probed by [`Config::load_or_default`], in order
pub const CONFIG_PATHS: &[&str] = &["promptscope.toml", "config/promptscope.toml"];

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from an explicit path, or probe the default locations
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                tracing::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => Ok(Self::load_or_default()),
        }
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        for path in CONFIG_PATHS {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path);
                    return config;
                }
                Err(e) => tracing::warn!("Ignoring {}: {}", path, e),
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Enabled providers, in configured order
    pub fn enabled_providers(&self) -> impl Iterator<Item = (&str, &ProviderConfig)> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(name, p)| (name.as_str(), p))
    }

    /// Get a specific provider config
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = IndexMap::new();

        let mut gemini = ProviderConfig::new(ProviderKind::Gemini, gemini::DEFAULT_MODEL);
        gemini.rpm = 15;
        gemini.tpm = 1_000_000;
        providers.insert("gemini".to_string(), gemini);

        let mut groq = ProviderConfig::new(ProviderKind::Groq, openai::GROQ_MODEL);
        groq.rpm = 30;
        groq.tpm = 6_000;
        groq.temperature = Some(openai::GROQ_TEMPERATURE);
        providers.insert("groq".to_string(), groq);

        let mut anthropic = ProviderConfig::new(ProviderKind::Anthropic, anthropic::DEFAULT_MODEL);
        anthropic.rpm = 50;
        anthropic.tpm = 40_000;
        providers.insert("anthropic".to_string(), anthropic);

        let mut openai = ProviderConfig::new(ProviderKind::OpenAI, openai::DEFAULT_MODEL);
        openai.rpm = 500;
        openai.tpm = 200_000;
        providers.insert("openai".to_string(), openai);

        Self {
            providers,
            runner: RunnerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
