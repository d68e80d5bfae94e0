//! Evaluator kinds

use crate::core::error::DomainError;
use crate::evaluation::extract::{extract_choice, extract_numeric};
use crate::evaluation::result::ScoredResult;
use serde::{Deserialize, Serialize};

/// Absolute tolerance for numeric answer matching.
pub const NUMERIC_TOLERANCE: f64 = 1e-6;

/// How answers for a dataset are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluatorKind {
    /// Final numeric answer must match (GSM8K style)
    Numeric,
    /// Single option letter must match (GPQA / MMLU style)
    MultipleChoice,
    /// Free-form answer graded by a judge model
    OpenEnded,
}

impl EvaluatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorKind::Numeric => "numeric",
            EvaluatorKind::MultipleChoice => "multiple-choice",
            EvaluatorKind::OpenEnded => "open-ended",
        }
    }

    /// Whether this kind can be checked without a judge.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, EvaluatorKind::OpenEnded)
    }

    /// Extract the comparable answer from free text (deterministic kinds only).
    pub fn extract(&self, text: &str) -> Option<String> {
        match self {
            EvaluatorKind::Numeric => extract_numeric(text).map(format_number),
            EvaluatorKind::MultipleChoice => extract_choice(text).map(String::from),
            EvaluatorKind::OpenEnded => None,
        }
    }

    /// Check `answer` against `expected` (deterministic kinds only).
    ///
    /// Returns `None` for [`EvaluatorKind::OpenEnded`].
    pub fn check(&self, answer: &str, expected: &str) -> Option<ScoredResult> {
        match self {
            EvaluatorKind::Numeric => Some(check_numeric(answer, expected)),
            EvaluatorKind::MultipleChoice => Some(check_choice(answer, expected)),
            EvaluatorKind::OpenEnded => None,
        }
    }
}

impl std::fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EvaluatorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "numeric" => Ok(EvaluatorKind::Numeric),
            "multiple-choice" | "multiple_choice" | "mcq" => Ok(EvaluatorKind::MultipleChoice),
            "open-ended" | "open_ended" | "judge" => Ok(EvaluatorKind::OpenEnded),
            other => Err(DomainError::UnknownEvaluator(other.to_string())),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn check_numeric(answer: &str, expected: &str) -> ScoredResult {
    let predicted = extract_numeric(answer);
    let correct = match (predicted, parse_expected_number(expected)) {
        (Some(p), Some(e)) => (p - e).abs() < NUMERIC_TOLERANCE,
        _ => false,
    };
    ScoredResult::new(correct, expected, predicted.map(format_number))
}

fn parse_expected_number(expected: &str) -> Option<f64> {
    expected.trim().replace(',', "").parse::<f64>().ok()
}

fn check_choice(answer: &str, expected: &str) -> ScoredResult {
    let predicted = extract_choice(answer);
    let correct = predicted
        .map(|p| p.eq_ignore_ascii_case(expected.trim()))
        .unwrap_or(false);
    ScoredResult::new(correct, expected, predicted.map(String::from))
}
