//! Async fan-out of one prompt to every provider

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::providers::{CompletionRequest, CompletionResponse, ProviderError, SharedProvider};

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum in-flight requests per provider
    pub parallel_requests: usize,
    /// Number of retries on transient failure
    pub retry_count: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Token limit sent with each request
    pub max_tokens: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_requests: 4,
            retry_count: 2,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30_000,
            timeout_ms: 60_000,
            max_tokens: 1024,
        }
    }
}

/// Result of sending the prompt to one provider.
///
/// Exactly one of `response_text` and `error_message` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider_name: String,
    pub model: Option<String>,
    pub response_text: Option<String>,
    /// Latency of the successful attempt; 0 on failure
    pub elapsed_ms: u64,
    pub error_message: Option<String>,
}

impl ProviderOutcome {
    pub fn success(provider: impl Into<String>, response: CompletionResponse) -> Self {
        Self {
            provider_name: provider.into(),
            model: Some(response.model),
            response_text: Some(response.content),
            elapsed_ms: response.latency_ms,
            error_message: None,
        }
    }

    pub fn failure(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider_name: provider.into(),
            model: None,
            response_text: None,
            elapsed_ms: 0,
            error_message: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.response_text.is_some()
    }
}

/// Sends prompts to a fixed set of providers
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    providers: Vec<SharedProvider>,
    semaphore: Arc<Semaphore>,
}

impl Executor {
    pub fn new(providers: Vec<SharedProvider>, config: ExecutorConfig) -> Self {
        let permits = (config.parallel_requests * providers.len()).max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            config,
            providers,
        }
    }

    pub fn providers(&self) -> &[SharedProvider] {
        &self.providers
    }

    /// Send `prompt` to every provider concurrently.
    ///
    /// Outcomes come back in provider order. Failures are reported in the
    /// outcome, never raised.
    pub async fn fan_out(&self, prompt: &str) -> Vec<ProviderOutcome> {
        let handles: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let executor = self.clone();
                let provider = provider.clone();
                let prompt = prompt.to_string();
                tokio::spawn(async move { executor.execute_for_provider(&provider, &prompt).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (provider, handle) in self.providers.iter().zip(handles) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Request to {} panicked: {}", provider.name(), e);
                    outcomes.push(ProviderOutcome::failure(
                        provider.name(),
                        format!("request task failed: {}", e),
                    ));
                }
            }
        }

        outcomes
    }

    /// Run one provider with retries, converting the final error into an outcome
    pub async fn execute_for_provider(
        &self,
        provider: &SharedProvider,
        prompt: &str,
    ) -> ProviderOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ProviderOutcome::failure(provider.name(), e.to_string()),
        };

        let request = CompletionRequest::prompt(prompt, self.config.max_tokens);
        let mut delay = self.config.retry_delay_ms;
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tracing::info!("Retry {} on {}", attempt, provider.name());
            }

            match self.try_execute(provider, &request).await {
                Ok(response) => {
                    tracing::info!(
                        "{} responded in {}ms ({} output tokens)",
                        provider.name(),
                        response.latency_ms,
                        response.output_tokens
                    );
                    return ProviderOutcome::success(provider.name(), response);
                }
                Err(e) => {
                    let retry = e.is_retryable() && attempt < self.config.retry_count;
                    if !retry {
                        tracing::error!("Error on {}: {}", provider.name(), e);
                        last_error = Some(e);
                        break;
                    }

                    let wait = match &e {
                        ProviderError::RateLimited { retry_after_ms } => {
                            (*retry_after_ms).min(self.config.max_retry_delay_ms)
                        }
                        _ => delay,
                    };
                    tracing::warn!("{} failed ({}), retrying in {}ms", provider.name(), e, wait);
                    sleep(Duration::from_millis(wait)).await;
                    delay = delay.saturating_mul(2).min(self.config.max_retry_delay_ms);
                    last_error = Some(e);
                }
            }
        }

        ProviderOutcome::failure(
            provider.name(),
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
        )
    }

    /// Single attempt bounded by the configured timeout
    async fn try_execute(
        &self,
        provider: &SharedProvider,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let timeout = Duration::from_millis(self.config.timeout_ms);

        match tokio::time::timeout(timeout, provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LLMProvider, ProviderResult};
    use crate::runner::RateLimiter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Provider replaying a script of results, then repeating the last one
    struct ScriptedProvider {
        name: String,
        script: Mutex<Vec<ProviderResult<String>>>,
        delay: Duration,
        calls: AtomicU32,
        limiter: Arc<RateLimiter>,
    }

    impl ScriptedProvider {
        fn new(name: &str, script: Vec<ProviderResult<String>>) -> Self {
            Self {
                name: name.to_string(),
                script: Mutex::new(script),
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
                limiter: Arc::new(RateLimiter::new(1000, 1_000_000)),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn default_model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.remove(0)
                } else {
                    match script.first() {
                        Some(Ok(text)) => Ok(text.clone()),
                        Some(Err(e)) => Err(replay(e)),
                        None => Ok(String::new()),
                    }
                }
            };

            next.map(|text| CompletionResponse {
                content: format!("{} ({})", text, request.messages[0].content),
                model: "scripted-1".to_string(),
                input_tokens: 1,
                output_tokens: 1,
                finish_reason: "stop".to_string(),
                latency_ms: 7,
            })
        }

        fn rate_limiter(&self) -> &Arc<RateLimiter> {
            &self.limiter
        }
    }

    fn replay(e: &ProviderError) -> ProviderError {
        match e {
            ProviderError::Api { status, message } => ProviderError::Api {
                status: *status,
                message: message.clone(),
            },
            ProviderError::RateLimited { retry_after_ms } => ProviderError::RateLimited {
                retry_after_ms: *retry_after_ms,
            },
            ProviderError::Timeout { timeout_ms } => ProviderError::Timeout {
                timeout_ms: *timeout_ms,
            },
            ProviderError::Config(msg) => ProviderError::Config(msg.clone()),
            other => ProviderError::Parse(other.to_string()),
        }
    }

    fn fast_config() -> ExecutorConfig {
        ExecutorConfig {
            retry_count: 2,
            retry_delay_ms: 1,
            max_retry_delay_ms: 5,
            timeout_ms: 1_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_outcomes_follow_provider_order() {
        let providers: Vec<SharedProvider> = vec![
            Arc::new(ScriptedProvider::new("slow", vec![Ok("a".into())]).slow(Duration::from_millis(30))),
            Arc::new(ScriptedProvider::new("fast", vec![Ok("b".into())])),
        ];
        let executor = Executor::new(providers, fast_config());

        let outcomes = executor.fan_out("hello").await;
        let names: Vec<&str> = outcomes.iter().map(|o| o.provider_name.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast"]);
        assert_eq!(outcomes[0].response_text.as_deref(), Some("a (hello)"));
        assert_eq!(outcomes[0].elapsed_ms, 7);
        assert_eq!(outcomes[0].model.as_deref(), Some("scripted-1"));
        assert!(outcomes.iter().all(|o| o.error_message.is_none()));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let provider = Arc::new(ScriptedProvider::new(
            "flaky",
            vec![
                Err(ProviderError::Api { status: 503, message: "busy".into() }),
                Err(ProviderError::RateLimited { retry_after_ms: 1 }),
                Ok("done".into()),
            ],
        ));
        let executor = Executor::new(vec![provider.clone()], fast_config());

        let outcomes = executor.fan_out("x").await;
        assert!(outcomes[0].is_success());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_config_errors_are_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(
            "nokey",
            vec![Err(ProviderError::Config("bad key".into()))],
        ));
        let executor = Executor::new(vec![provider.clone()], fast_config());

        let outcome = &executor.fan_out("x").await[0];
        assert_eq!(provider.calls(), 1);
        assert!(outcome.response_text.is_none());
        assert_eq!(outcome.elapsed_ms, 0);
        assert!(outcome.error_message.as_deref().unwrap().contains("bad key"));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let provider = Arc::new(ScriptedProvider::new(
            "down",
            vec![Err(ProviderError::Api { status: 500, message: "down".into() })],
        ));
        let executor = Executor::new(vec![provider.clone()], fast_config());

        let outcome = &executor.fan_out("x").await[0];
        assert!(!outcome.is_success());
        // first attempt plus two retries
        assert_eq!(provider.calls(), 3);
        assert!(outcome.error_message.as_deref().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let provider: SharedProvider = Arc::new(
            ScriptedProvider::new("stuck", vec![Ok("late".into())]).slow(Duration::from_secs(30)),
        );
        let config = ExecutorConfig {
            retry_count: 0,
            timeout_ms: 20,
            ..fast_config()
        };
        let executor = Executor::new(vec![provider], config);

        let outcome = &executor.fan_out("x").await[0];
        assert_eq!(outcome.error_message.as_deref(), Some("Timeout after 20ms"));
    }

    #[tokio::test]
    async fn test_no_providers() {
        let executor = Executor::new(Vec::new(), ExecutorConfig::default());
        assert!(executor.fan_out("x").await.is_empty());
    }
}
