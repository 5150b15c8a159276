//! LLM Provider implementations

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};

use crate::config::{Config, ProviderConfig, ProviderKind};
use std::sync::Arc;

pub type SharedProvider = Arc<dyn LLMProvider + Send + Sync>;

/// Key and enablement status of one configured provider
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub name: String,
    pub kind: ProviderKind,
    pub model: String,
    pub enabled: bool,
    pub key_env: String,
    pub key_set: bool,
}

/// Build one client from its config entry, reading the key from the environment
pub fn build_provider(name: &str, pc: &ProviderConfig) -> ProviderResult<SharedProvider> {
    let key_env = pc.key_env();
    let api_key = std::env::var(key_env)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProviderError::Config(format!("{} not set", key_env)))?;

    let provider: SharedProvider = match pc.kind {
        ProviderKind::Anthropic => {
            let mut c = AnthropicClient::new(api_key)
                .with_name(name)
                .with_rate_limits(pc.rpm, pc.tpm)
                .with_model(&pc.default_model);
            if let Some(url) = &pc.base_url {
                c = c.with_base_url(url);
            }
            if let Some(max) = pc.max_tokens {
                c = c.with_max_tokens(max);
            }
            if let Some(t) = pc.temperature {
                c = c.with_temperature(t);
            }
            Arc::new(c)
        }
        ProviderKind::OpenAI | ProviderKind::Groq => {
            let base = if pc.kind == ProviderKind::Groq {
                OpenAIClient::groq(api_key)
            } else {
                OpenAIClient::new(api_key)
            };
            let mut c = base
                .with_name(name)
                .with_rate_limits(pc.rpm, pc.tpm)
                .with_model(&pc.default_model);
            if let Some(url) = &pc.base_url {
                c = c.with_base_url(url);
            }
            if let Some(max) = pc.max_tokens {
                c = c.with_max_tokens(max);
            }
            if let Some(t) = pc.temperature {
                c = c.with_temperature(t);
            }
            Arc::new(c)
        }
        ProviderKind::Gemini => {
            let mut c = GeminiClient::new(api_key)
                .with_name(name)
                .with_rate_limits(pc.rpm, pc.tpm)
                .with_model(&pc.default_model);
            if let Some(url) = &pc.base_url {
                c = c.with_base_url(url);
            }
            if let Some(max) = pc.max_tokens {
                c = c.with_max_tokens(max);
            }
            if let Some(t) = pc.temperature {
                c = c.with_temperature(t);
            }
            Arc::new(c)
        }
    };

    Ok(provider)
}

/// Create every enabled provider whose key is set; the rest are skipped
pub fn create_all_providers_with_config(config: &Config) -> Vec<SharedProvider> {
    let mut providers = Vec::new();

    for (name, pc) in config.enabled_providers() {
        match build_provider(name, pc) {
            Ok(provider) => providers.push(provider),
            Err(e) => tracing::info!("Skipping provider {}: {}", name, e),
        }
    }

    providers
}

/// Create specific providers by name; unknown names and missing keys are errors
pub fn create_providers_with_config(
    names: &[&str],
    config: &Config,
) -> ProviderResult<Vec<SharedProvider>> {
    names
        .iter()
        .map(|name| {
            let pc = config
                .get_provider(name)
                .ok_or_else(|| ProviderError::Config(format!("Unknown provider: {}", name)))?;
            build_provider(name, pc)
        })
        .collect()
}

/// Status of every configured provider, in configured order
pub fn provider_statuses(config: &Config) -> Vec<ProviderStatus> {
    config
        .providers
        .iter()
        .map(|(name, pc)| ProviderStatus {
            name: name.clone(),
            kind: pc.kind,
            model: pc.default_model.clone(),
            enabled: pc.enabled,
            key_env: pc.key_env().to_string(),
            key_set: pc.has_api_key(),
        })
        .collect()
}
