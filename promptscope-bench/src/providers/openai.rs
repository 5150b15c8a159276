//! OpenAI Chat Completions client
//!
//! Also serves OpenAI-compatible endpoints such as Groq, which only differ in
//! base URL, key and default model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::traits::{
    retry_after_ms, CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError,
    ProviderResult,
};
use crate::runner::rate_limiter::RateLimiter;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_MODEL: &str = "mixtral-8x7b-32768";
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const GROQ_TEMPERATURE: f32 = 0.7;

/// OpenAI-compatible chat completions client
pub struct OpenAIClient {
    name: String,
    api_key: String,
    base_url: String,
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    default_model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        Self {
            name: "openai".to_string(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            rate_limiter: Arc::new(RateLimiter::new(500, 200_000)),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Client preset for Groq's OpenAI-compatible endpoint
    pub fn groq(api_key: String) -> Self {
        Self::new(api_key)
            .with_name("groq")
            .with_base_url(GROQ_BASE_URL)
            .with_model(GROQ_MODEL)
            .with_temperature(GROQ_TEMPERATURE)
            .with_rate_limits(30, 6_000)
    }

    /// Create from environment variable
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ProviderError::Config(format!("{} not set", API_KEY_ENV)))?;
        Ok(Self::new(api_key))
    }

    /// Name reported in outcomes
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_rate_limits(mut self, rpm: u32, tpm: u32) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(rpm, tpm));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Override the request's token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Temperature used when the request does not set one
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages: Vec<OpenAIMessage> = Vec::new();
        if let Some(system) = request.system_text() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.extend(request.conversation().map(OpenAIMessage::from));

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let max_tokens = self.max_tokens.unwrap_or(request.max_tokens);
        let temperature = request.temperature.or(self.temperature);

        // Reasoning models take max_completion_tokens and reject temperature
        let is_reasoning = model.starts_with("o1") || model.starts_with("o3");
        if is_reasoning || model.starts_with("gpt-5") {
            OpenAIRequest {
                model,
                messages,
                max_tokens: None,
                max_completion_tokens: Some(max_tokens),
                temperature: if is_reasoning { None } else { temperature },
            }
        } else {
            OpenAIRequest {
                model,
                messages,
                max_tokens: Some(max_tokens),
                max_completion_tokens: None,
                temperature,
            }
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: String,
}

impl From<&Message> for OpenAIMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: OpenAIUsage,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let _guard = self.rate_limiter.acquire().await;

        let start = Instant::now();
        let body = self.build_body(request);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        if status == 429 {
            let retry_after = retry_after_ms(response.headers());

            // 429 covers both rate limits and an exhausted quota; only the first is worth retrying
            let body = response.text().await.unwrap_or_default();
            if let Ok(error) = serde_json::from_str::<OpenAIError>(&body) {
                let error_type = error.error.error_type.as_deref().unwrap_or("");
                if error_type == "insufficient_quota"
                    || error.error.message.contains("exceeded your current quota")
                {
                    return Err(ProviderError::Config(format!(
                        "{} quota exceeded: {}",
                        self.name, error.error.message
                    )));
                }
                tracing::debug!("Rate limited (type={}): {}", error_type, error.error.message);
            }

            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAIError>(&body) {
                Ok(error) => error.error.message,
                Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
            };

            if status == 401 || status == 403 {
                return Err(ProviderError::Config(format!(
                    "{} auth error ({}): {}",
                    self.name,
                    status.as_u16(),
                    message
                )));
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        self.rate_limiter
            .record_tokens(api_response.usage.prompt_tokens + api_response.usage.completion_tokens)
            .await;

        let choice = api_response
            .choices
            .first()
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.clone(),
            model: api_response.model.clone(),
            input_tokens: api_response.usage.prompt_tokens,
            output_tokens: api_response.usage.completion_tokens,
            finish_reason: choice
                .finish_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            latency_ms,
        })
    }

    fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }
}
