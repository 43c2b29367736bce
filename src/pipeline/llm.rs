//! Model interaction: send the composite prompt and return the raw reply.
//!
//! The pipeline talks to the model through the small [`CompletionModel`]
//! trait rather than to an edgequake-llm provider directly, so the rest of
//! the pipeline can be exercised with a scripted model in tests.
//! [`ProviderModel`] is the production implementation.
//!
//! ## Retry Strategy
//!
//! One attempt by default. With `max_retries > 0` failed calls are retried
//! with exponential backoff (`retry_backoff_ms * 2^attempt`, capped at
//! [`MAX_BACKOFF_MS`]). Timeouts count as failed attempts.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Longest sleep between two attempts.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// The model's reply and its token usage.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// One system message + one user message in, text out.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        config: &AnalysisConfig,
    ) -> Result<Completion, AnalysisError>;
}

/// [`CompletionModel`] backed by an edgequake-llm provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionModel for ProviderModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        config: &AnalysisConfig,
    ) -> Result<Completion, AnalysisError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = build_options(config);
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| AnalysisError::LlmApiError {
                message: format!("{}", e),
            })?;
        Ok(Completion {
            content: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Send the analysis request, honouring the configured timeout and retries.
pub async fn request_analysis(
    model: &dyn CompletionModel,
    system: &str,
    user: &str,
    config: &AnalysisConfig,
) -> Result<Completion, AnalysisError> {
    let start = Instant::now();
    let limit = Duration::from_secs(config.api_timeout_secs);
    let mut last_err: Option<AnalysisError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Analysis request: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let outcome = match timeout(limit, model.complete(system, user, config)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::ApiTimeout {
                secs: config.api_timeout_secs,
            }),
        };

        match outcome {
            Ok(completion) => {
                debug!(
                    "Analysis request: {} input tokens, {} output tokens, {:?}",
                    completion.input_tokens,
                    completion.output_tokens,
                    start.elapsed()
                );
                return Ok(completion);
            }
            Err(e) => {
                warn!("Analysis request: attempt {} failed: {}", attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| AnalysisError::LlmApiError {
        message: "Unknown error".to_string(),
    }))
}

/// Delay before retry `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor))
        .min(MAX_BACKOFF_MS)
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails `failures` times, then answers.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionModel for Flaky {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _config: &AnalysisConfig,
        ) -> Result<Completion, AnalysisError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(AnalysisError::LlmApiError {
                    message: format!("boom {n}"),
                })
            } else {
                Ok(Completion {
                    content: "{}".into(),
                    input_tokens: 10,
                    output_tokens: 2,
                })
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionModel for Stalled {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _config: &AnalysisConfig,
        ) -> Result<Completion, AnalysisError> {
            sleep(Duration::from_secs(30)).await;
            Ok(Completion::default())
        }
    }

    #[test]
    fn build_options_defaults() {
        let config = AnalysisConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[tokio::test]
    async fn single_attempt_by_default() {
        let model = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let err = request_analysis(&model, "s", "u", &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom 0"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_when_configured() {
        let model = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let config = AnalysisConfig::builder()
            .max_retries(2)
            .retry_backoff_ms(1)
            .build()
            .unwrap();
        let completion = request_analysis(&model, "s", "u", &config).await.unwrap();
        assert_eq!(completion.input_tokens, 10);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(500, 10), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(500, 70), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(0, 70), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn many_retries_do_not_overflow() {
        let model = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        // Fields are public, so the builder cap can be sidestepped.
        let mut config = AnalysisConfig::default();
        config.max_retries = 70;
        config.retry_backoff_ms = 1;
        let err = request_analysis(&model, "s", "u", &config).await.unwrap_err();
        assert!(err.to_string().contains("boom 70"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 71);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_model_times_out() {
        let config = AnalysisConfig::builder().api_timeout_secs(1).build().unwrap();
        let err = request_analysis(&Stalled, "s", "u", &config).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ApiTimeout { secs: 1 }));
    }
}
