// RetryPolicy: exponential backoff with jitter around a single backend call
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use super::CollectError;
use std::future::Future;
use std::time::Duration;
use tracing::{
    debug,
    warn,
};

/// How a single backend call is retried.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. Values below 1 are
    /// treated as 1.
    pub max_attempts: u32,

    /// Delay before the first retry. Doubles on every further retry.
    pub base_delay: Duration,

    /// Upper bound for a single delay, before jitter.
    pub max_delay: Duration,

    /// Optional timeout applied to each attempt.
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay:   Duration::from_millis(200),
            max_delay:    Duration::from_secs(10),
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed `attempt` (1-based).
    ///
    /// The exponential delay is capped at `max_delay`, then half of it is
    /// kept and the other half is randomised, so concurrent callers that
    /// were throttled together don't all come back at once.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);

        let half = delay / 2;

        half + half.mul_f64(rand::random::<f64>())
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent.
    ///
    /// `operation` and `bucket` are only used for logging.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        bucket: &str,
        mut call: F,
    ) -> Result<T, CollectError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollectError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match self.call_timeout {
                Some(timeout) => {
                    match tokio::time::timeout(timeout, call()).await {
                        Ok(result) => result,
                        Err(_)     => Err(CollectError::Timeout(timeout)),
                    }
                },
                None => call().await,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err)  => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt >= max_attempts {
                warn!(
                    operation,
                    bucket,
                    attempts = attempt,
                    error = %err,
                    "giving up after retries",
                );

                return Err(CollectError::RetriesExhausted {
                    attempts: attempt,
                    last:     Box::new(err),
                });
            }

            let delay = self.backoff(attempt);

            debug!(
                operation,
                bucket,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying",
            );

            tokio::time::sleep(delay).await;
        }
    }
}
