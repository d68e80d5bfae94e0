//! Scored result value object

use serde::{Deserialize, Serialize};

/// Outcome of checking one answer against ground truth.
///
/// `predicted` is `None` when no answer could be extracted, or when the
/// check itself failed (judge timeout or error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub correct: bool,
    pub expected: String,
    pub predicted: Option<String>,
}

impl ScoredResult {
    pub fn new(correct: bool, expected: impl Into<String>, predicted: Option<String>) -> Self {
        Self {
            correct,
            expected: expected.into(),
            predicted,
        }
    }

    /// The degraded result used when a check could not complete.
    pub fn failed(expected: impl Into<String>) -> Self {
        Self::new(false, expected, None)
    }
}
