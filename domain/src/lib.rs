//! Domain layer for quorum-bench
//!
//! This crate contains the benchmark entities, consensus and evaluation
//! vocabulary, and the statistics used to judge regressions. It has no
//! dependencies on infrastructure, presentation, or an async runtime.
//!
//! # Core Concepts
//!
//! ## Ensemble
//!
//! Every question is sent to an ensemble of models. Duplicate members of the
//! same model are kept apart by the occurrence counter in [`ensemble`].
//!
//! ## Consensus
//!
//! - **Standard**: merge every answer into one
//! - **Elo**: rank pairwise, merge the top answers
//! - **Majority**: score alignment, merge toward the majority position
//!
//! ## Regression
//!
//! A [`GoldenBaseline`] pins per-question results; a [`RegressionVerdict`]
//! compares a new run against it using [`stats`].

pub mod benchmark;
pub mod consensus;
pub mod core;
pub mod ensemble;
pub mod evaluation;
pub mod prompt;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use benchmark::{
    AccuracyRow, BaselineQuestionResult, BenchmarkOutput, BrokenQuestion, ConsensusAnswer,
    EnsembleSummary, GoldenBaseline, PairedComparison, QuestionRun, RawResponse,
    RegressionVerdict, StrategyComparison, TierConfig,
};
pub use consensus::{
    ConsensusStrategyKind, ELO_INSUFFICIENT_RESPONSES, EnsembleResponse,
    MAJORITY_INSUFFICIENT_RESPONSES, SYNTHESIS_FAILED, is_insufficient_sentinel,
};
pub use core::{error::DomainError, model::ModelSpec, question::Question};
pub use ensemble::{OccurrenceCounter, member_keys};
pub use evaluation::{EvaluatorKind, ScoredResult};
pub use prompt::PromptTemplate;
pub use session::stream::{StreamEvent, TokenUsage};
