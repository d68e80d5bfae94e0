//! Runner parameters.
//!
//! [`RunnerParams`] groups the static knobs that shape a run in
//! [`RunBenchmarkUseCase`](crate::use_cases::run_benchmark::RunBenchmarkUseCase).
//! They are application concerns, not domain policy.

use crate::concurrency::ConcurrencyConfig;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerParams {
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryPolicy,
    /// Upper bound for one evaluation call (judge included)
    pub evaluation_timeout: Duration,
    /// Questions processed at the same time
    pub question_parallelism: usize,
    /// Responses merged by ranking strategies
    pub top_n: usize,
}

impl Default for RunnerParams {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyConfig::default(),
            retry: RetryPolicy::default(),
            evaluation_timeout: Duration::from_secs(120),
            question_parallelism: 4,
            top_n: 3,
        }
    }
}

impl RunnerParams {
    // ==================== Builder Methods ====================

    pub fn with_concurrency(mut self, concurrency: ConcurrencyConfig) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_evaluation_timeout(mut self, timeout: Duration) -> Self {
        self.evaluation_timeout = timeout;
        self
    }

    pub fn with_question_parallelism(mut self, parallelism: usize) -> Self {
        self.question_parallelism = parallelism.max(1);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = RunnerParams::default();
        assert_eq!(params.question_parallelism, 4);
        assert_eq!(params.top_n, 3);
        assert_eq!(params.retry.max_attempts, 4);
        assert_eq!(params.concurrency.initial, 4);
    }

    #[test]
    fn test_builder() {
        let params = RunnerParams::default()
            .with_question_parallelism(0)
            .with_top_n(5)
            .with_evaluation_timeout(Duration::from_secs(30));
        assert_eq!(params.question_parallelism, 1);
        assert_eq!(params.top_n, 5);
        assert_eq!(params.evaluation_timeout, Duration::from_secs(30));
    }
}
