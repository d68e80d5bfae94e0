//! Evaluation domain
//!
//! Scoring of a single answer against ground truth. Deterministic checkers
//! (numeric, multiple choice) live here; open-ended grading needs a judge
//! and is driven from the application layer using [`parse_judge_verdict`].

pub mod extract;
pub mod kind;
pub mod result;

pub use extract::{extract_choice, extract_numeric, parse_judge_verdict};
pub use kind::EvaluatorKind;
pub use result::ScoredResult;
