//! Application layer for quorum-bench
//!
//! This crate contains use cases, port definitions, concurrency and retry
//! control, and application configuration. It depends only on the domain
//! layer.

pub mod client;
pub mod concurrency;
pub mod config;
pub mod ports;
pub mod retry;
pub mod use_cases;

// Re-export commonly used types
pub use client::ModelClient;
pub use concurrency::{
    AdaptiveConcurrencyController, ConcurrencyConfig, ControllerSnapshot, RateLimitAware,
};
pub use config::{RegressionParams, RunnerParams};
pub use ports::{
    llm_gateway::{GatewayError, GeneratedText, LlmGateway, PromptRequest, StreamHandle},
    progress::{BenchmarkProgressNotifier, CompositeProgressNotifier, NoProgress, QuestionProgress},
    response_cache::{CacheError, NoCache, ResponseCache},
    run_store::{RunStore, StoreError},
};
pub use retry::{RetryHooks, RetryPolicy};
pub use use_cases::compare_regression::{CompareRegressionUseCase, RegressionError};
pub use use_cases::consensus::{ConsensusModels, ConsensusRegistry, ConsensusStrategy};
pub use use_cases::evaluate::{EvaluationEngine, Evaluator};
pub use use_cases::run_benchmark::{RunBenchmarkError, RunBenchmarkInput, RunBenchmarkUseCase};
