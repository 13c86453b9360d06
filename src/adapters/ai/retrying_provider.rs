//! Retrying AI Provider - Wrapper adding a per-attempt timeout and bounded
//! exponential backoff around any provider.
//!
//! Retryable errors (rate limit, unavailable, network, timeout) are retried
//! up to `max_retries` extra times, sleeping `base_backoff * 2^attempt`
//! between attempts. Anything else is returned immediately.
//!
//! # Example
//!
//! ```ignore
//! let provider = RetryingAIProvider::new(GeminiProvider::new(config)?)
//!     .with_policy(RetryPolicy::new(3, Duration::from_millis(500)));
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo};

/// Retry and timeout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_backoff: Duration,
    /// Upper bound on a single attempt, if any.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .checked_mul(1u32 << attempt.min(16))
            .unwrap_or(Duration::MAX)
    }

    /// No retries, no timeout.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// AI provider wrapper with bounded retries.
pub struct RetryingAIProvider<P: AIProvider> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: AIProvider> RetryingAIProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        match self.policy.attempt_timeout {
            Some(limit) => timeout(limit, self.inner.complete(request))
                .await
                .unwrap_or(Err(AIError::Timeout {
                    timeout_secs: limit.as_secs() as u32,
                })),
            None => self.inner.complete(request).await,
        }
    }
}

#[async_trait]
impl<P: AIProvider> AIProvider for RetryingAIProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut attempt = 0;
        loop {
            match self.attempt(request.clone()).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(attempt, purpose = %request.metadata.purpose, "AI request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retryable AI error, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "AI request failed");
                    return Err(err);
                }
            }
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.inner.provider_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::ports::RequestMetadata;

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new("test"))
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(800));
    }

    #[test]
    fn backoff_saturates_for_large_attempts() {
        let policy = RetryPolicy::new(100, Duration::from_secs(u64::MAX / 2));
        assert_eq!(policy.backoff_for(40), Duration::MAX);
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let mock = MockAIProvider::new()
            .with_error(MockError::Unavailable { message: "503".into() })
            .with_error(MockError::Network { message: "reset".into() })
            .with_response("ok");
        let provider = RetryingAIProvider::new(mock.clone()).with_policy(fast_policy(3));

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let mock = MockAIProvider::new()
            .with_error(MockError::Unavailable { message: "1".into() })
            .with_error(MockError::Unavailable { message: "2".into() })
            .with_error(MockError::Unavailable { message: "3".into() })
            .with_response("too late");
        let provider = RetryingAIProvider::new(mock.clone()).with_policy(fast_policy(2));

        let result = provider.complete(request()).await;
        assert!(matches!(result, Err(AIError::Unavailable { .. })));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn non_retryable_errors_return_immediately() {
        let mock = MockAIProvider::new()
            .with_error(MockError::AuthenticationFailed)
            .with_response("unused");
        let provider = RetryingAIProvider::new(mock.clone()).with_policy(fast_policy(3));

        let result = provider.complete(request()).await;
        assert!(matches!(result, Err(AIError::AuthenticationFailed)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let mock = MockAIProvider::new().with_delay(Duration::from_millis(200));
        let provider = RetryingAIProvider::new(mock.clone())
            .with_policy(fast_policy(1).with_attempt_timeout(Duration::from_millis(20)));

        let result = provider.complete(request()).await;
        assert!(matches!(result, Err(AIError::Timeout { .. })));
        assert_eq!(mock.call_count(), 2);
    }
}
