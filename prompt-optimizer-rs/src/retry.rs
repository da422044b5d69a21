// prompt-optimizer-rs/src/retry.rs
// Caller-owned retry and timeout policy for completion calls.
//
// Completion clients make exactly one attempt. The optimizer wraps the
// injected client in a RetryingClient so every collaborator shares one
// policy: an optional per-attempt deadline plus exponential backoff with
// jitter for transient failures.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use llm_client::{Completion, CompletionClient, CompletionRequest, LlmError};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; 0 disables retries
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Doubling delays with 50% randomization, capped at `max_delay`.
    /// The attempt count, not elapsed time, bounds the retries.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.5)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Decorates a client with a timeout per attempt and retries of transient errors.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
    timeout: Option<Duration>,
}

impl<C: CompletionClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            policy,
            timeout,
        }
    }

    async fn attempt(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.complete(request))
                .await
                .map_err(|_| LlmError::Timeout(format!("no response within {:?}", limit)))?,
            None => self.inner.complete(request).await,
        }
    }
}

#[async_trait]
impl<C: CompletionClient> CompletionClient for RetryingClient<C> {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let mut backoff = self.policy.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.attempt(request.clone()).await {
                Ok(completion) => return Ok(completion),
                Err(err) => {
                    if !err.is_retryable() || attempt > self.policy.max_retries {
                        if attempt > 1 {
                            tracing::warn!(attempts = attempt, error = %err, "completion failed after retries");
                        }
                        return Err(err);
                    }

                    let Some(delay) = backoff.next_backoff() else {
                        return Err(err);
                    };
                    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=50));

                    tracing::warn!(
                        attempt,
                        error = %err,
                        delay_ms = (delay + jitter).as_millis() as u64,
                        "retryable completion error"
                    );
                    metrics::increment_counter!("prompt_optimizer_completion_retries_total");

                    tokio::time::sleep(delay + jitter).await;
                }
            }
        }
    }
}
