//! Regression verdict

use crate::stats::{BootstrapResult, ProportionInterval};
use serde::{Deserialize, Serialize};

/// Baseline vs. current comparison for one strategy on one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub strategy: String,
    pub dataset: String,
    /// Matched questions scored under this strategy in both sets
    pub pairs: usize,
    pub baseline_correct: usize,
    pub baseline_total: usize,
    pub current_correct: usize,
    pub current_total: usize,
    pub baseline_accuracy: f64,
    pub current_accuracy: f64,
    /// `current_accuracy - baseline_accuracy`
    pub delta: f64,
    /// One-sided Fisher p-value
    pub p_value: f64,
    /// Holm-corrected p-value, when correction is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_p_value: Option<f64>,
    pub odds_ratio: f64,
    pub significant: bool,
    /// Two-sided McNemar p-value on the paired outcomes
    pub mcnemar_p_value: f64,
    pub bootstrap: BootstrapResult,
    pub baseline_interval: ProportionInterval,
    pub current_interval: ProportionInterval,
}

impl StrategyComparison {
    pub fn is_regression(&self) -> bool {
        self.significant && self.delta < 0.0
    }
}

/// A question correct in the baseline and incorrect now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenQuestion {
    pub question_id: String,
    pub dataset: String,
    pub strategy: String,
    pub expected: String,
    pub baseline_answer: Option<String>,
    pub current_answer: Option<String>,
}

/// Outcome of comparing a run set against a golden baseline. Always
/// recomputed, never stored as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionVerdict {
    pub passed: bool,
    pub threshold: f64,
    pub holm_corrected: bool,
    pub matched_questions: usize,
    pub comparisons: Vec<StrategyComparison>,
    pub broken_questions: Vec<BrokenQuestion>,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

impl RegressionVerdict {
    pub fn regressions(&self) -> impl Iterator<Item = &StrategyComparison> {
        self.comparisons.iter().filter(|c| c.is_regression())
    }

    pub fn broken_for<'a>(&'a self, strategy: &'a str) -> impl Iterator<Item = &'a BrokenQuestion> {
        self.broken_questions
            .iter()
            .filter(move |b| b.strategy == strategy)
    }
}
