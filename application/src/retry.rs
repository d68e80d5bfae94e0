//! Bounded exponential backoff around a single gateway call

use crate::ports::llm_gateway::GatewayError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::warn;

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
    /// Wall-clock budget across all attempts and sleeps
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_millis(500),
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

type RateLimitHook<'a> = Box<dyn Fn() + Send + Sync + 'a>;
type RetryHook<'a> = Box<dyn Fn(&GatewayError, u32) + Send + Sync + 'a>;

/// Optional callbacks fired before each retry sleep.
#[derive(Default)]
pub struct RetryHooks<'a> {
    on_rate_limit: Option<RateLimitHook<'a>>,
    on_retry: Option<RetryHook<'a>>,
}

impl<'a> RetryHooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_rate_limit(mut self, hook: impl Fn() + Send + Sync + 'a) -> Self {
        self.on_rate_limit = Some(Box::new(hook));
        self
    }

    /// `hook(error, attempt)` with `attempt` counted from 1
    pub fn on_retry(mut self, hook: impl Fn(&GatewayError, u32) + Send + Sync + 'a) -> Self {
        self.on_retry = Some(Box::new(hook));
        self
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_jitter,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backoff before retry number `attempt + 1`, without jitter.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.base_backoff(attempt) + jitter
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts or overall timeout run out.
    pub async fn run<F, Fut, T>(&self, mut op: F, hooks: &RetryHooks<'_>) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut last_error: Option<String> = None;
        let mut attempt: u32 = 0;

        loop {
            let result = match deadline {
                Some(at) => match timeout_at(at, op()).await {
                    Ok(result) => result,
                    Err(_) => return Err(self.deadline_exceeded(attempt + 1, last_error)),
                },
                None => op().await,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt + 1 >= max_attempts || !err.is_retryable() {
                return Err(err);
            }

            if let Some(hook) = &hooks.on_rate_limit {
                hook();
            }
            if let Some(hook) = &hooks.on_retry {
                hook(&err, attempt + 1);
            }

            let delay = self.delay_for(attempt);
            warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "Retrying after error: {}", err);
            last_error = Some(err.to_string());
            attempt += 1;

            match deadline {
                Some(at) => {
                    if timeout_at(at, sleep(delay)).await.is_err() {
                        return Err(self.deadline_exceeded(attempt, last_error));
                    }
                }
                None => sleep(delay).await,
            }
        }
    }

    fn deadline_exceeded(&self, attempts: u32, last_error: Option<String>) -> GatewayError {
        GatewayError::DeadlineExceeded {
            timeout: self.timeout.unwrap_or_default(),
            attempts,
            last_error,
        }
    }
}
