//! Benchmark domain
//!
//! Entities produced by a benchmark run and the artifacts derived from it:
//! the per-question [`QuestionRun`], the checkpointed [`BenchmarkOutput`]
//! accumulator, the write-once [`GoldenBaseline`], and the derived
//! [`RegressionVerdict`] and [`EnsembleSummary`].

pub mod baseline;
pub mod entities;
pub mod summary;
pub mod verdict;

pub use baseline::{BaselineQuestionResult, GoldenBaseline, TierConfig};
pub use entities::{BenchmarkOutput, ConsensusAnswer, QuestionRun, RawResponse};
pub use summary::{AccuracyRow, EnsembleSummary, PairedComparison};
pub use verdict::{BrokenQuestion, RegressionVerdict, StrategyComparison};
