//! Runner configuration (`[runner]` section)

use quorum_application::{ConcurrencyConfig, RetryPolicy, RunnerParams};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Concurrency, retry and timeout settings for `run`
///
/// # Example
///
/// ```toml
/// [runner]
/// concurrency_initial = 4
/// concurrency_min = 1
/// concurrency_max = 16
/// concurrency_cooldown_secs = 5
/// retry_attempts = 4
/// retry_base_delay_ms = 1000
/// retry_max_jitter_ms = 500
/// retry_timeout_secs = 300     # 0 disables the overall deadline
/// evaluation_timeout_secs = 120
/// question_parallelism = 4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRunnerConfig {
    pub concurrency_initial: usize,
    pub concurrency_min: usize,
    pub concurrency_max: usize,
    pub concurrency_cooldown_secs: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_jitter_ms: u64,
    pub retry_timeout_secs: u64,
    pub evaluation_timeout_secs: u64,
    pub question_parallelism: usize,
}

impl Default for FileRunnerConfig {
    fn default() -> Self {
        let concurrency = ConcurrencyConfig::default();
        let retry = RetryPolicy::default();
        let params = RunnerParams::default();
        Self {
            concurrency_initial: concurrency.initial,
            concurrency_min: concurrency.min,
            concurrency_max: concurrency.max,
            concurrency_cooldown_secs: concurrency.cooldown.as_secs(),
            retry_attempts: retry.max_attempts,
            retry_base_delay_ms: retry.base_delay.as_millis() as u64,
            retry_max_jitter_ms: retry.max_jitter.as_millis() as u64,
            retry_timeout_secs: retry.timeout.map_or(0, |t| t.as_secs()),
            evaluation_timeout_secs: params.evaluation_timeout.as_secs(),
            question_parallelism: params.question_parallelism,
        }
    }
}

impl FileRunnerConfig {
    pub fn concurrency(&self) -> ConcurrencyConfig {
        ConcurrencyConfig::new(
            self.concurrency_initial,
            self.concurrency_min,
            self.concurrency_max,
            Duration::from_secs(self.concurrency_cooldown_secs),
        )
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_jitter_ms),
        )
        .with_timeout((self.retry_timeout_secs > 0).then(|| Duration::from_secs(self.retry_timeout_secs)))
    }
}
