//! Compare Regression use case
//!
//! Joins a golden baseline with current run outputs on `(dataset, question id)`
//! and decides, per strategy and dataset, whether accuracy dropped by more
//! than chance.
//!
//! The decision test is one-sided Fisher (H1: baseline accuracy is higher)
//! combined with `delta < 0`. McNemar, the paired bootstrap and Wilson
//! intervals are reported alongside as diagnostics.

use quorum_domain::stats::{
    BootstrapConfig, Z_95, fisher_exact_one_sided, holm_bonferroni, mcnemar_test,
    paired_bootstrap_seeded, wilson_interval,
};
use quorum_domain::{
    BaselineQuestionResult, BenchmarkOutput, BrokenQuestion, GoldenBaseline, QuestionRun,
    RegressionVerdict, StrategyComparison,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq)]
pub enum RegressionError {
    #[error("Baseline '{tier}' and the current runs share no question ids")]
    NoOverlap { tier: String },
}

/// Parameters for the regression decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionParams {
    /// p-value below which a negative delta counts as a regression
    pub threshold: f64,
    /// Replace raw p-values with Holm-corrected ones for the decision
    pub holm: bool,
    pub bootstrap: BootstrapConfig,
}

impl Default for RegressionParams {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            holm: false,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// One matched question
struct Matched<'a> {
    dataset: &'a str,
    baseline: &'a BaselineQuestionResult,
    current: &'a QuestionRun,
}

pub struct CompareRegressionUseCase {
    params: RegressionParams,
}

impl CompareRegressionUseCase {
    pub fn new(params: RegressionParams) -> Self {
        Self { params }
    }

    pub fn execute(
        &self,
        baseline: &GoldenBaseline,
        current: &[BenchmarkOutput],
    ) -> Result<RegressionVerdict, RegressionError> {
        let pinned: HashSet<&str> = baseline.question_ids.iter().map(String::as_str).collect();

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut matched: Vec<Matched<'_>> = Vec::new();
        for output in current {
            for run in &output.runs {
                if !pinned.contains(run.question_id.as_str())
                    || !seen.insert((output.dataset.as_str(), run.question_id.as_str()))
                {
                    continue;
                }
                if let Some(result) = baseline.result(&output.dataset, &run.question_id) {
                    matched.push(Matched {
                        dataset: &output.dataset,
                        baseline: result,
                        current: run,
                    });
                }
            }
        }

        if matched.is_empty() {
            return Err(RegressionError::NoOverlap {
                tier: baseline.tier.clone(),
            });
        }
        info!(tier = %baseline.tier, matched = matched.len(), "Comparing against baseline");

        // Datasets in current-run order, strategies sorted within each
        let mut rows: Vec<(&str, String)> = Vec::new();
        for output in current {
            let strategies: BTreeSet<&String> = matched
                .iter()
                .filter(|m| m.dataset == output.dataset)
                .flat_map(|m| m.baseline.consensus_scores.keys().chain(m.current.consensus_scores.keys()))
                .collect();
            for strategy in strategies {
                if !rows.iter().any(|(d, s)| *d == output.dataset && s == strategy) {
                    rows.push((output.dataset.as_str(), strategy.clone()));
                }
            }
        }

        let mut comparisons: Vec<StrategyComparison> = rows
            .iter()
            .map(|(dataset, strategy)| self.compare_strategy(&matched, dataset, strategy))
            .collect();

        if self.params.holm && !comparisons.is_empty() {
            let p_values: Vec<f64> = comparisons.iter().map(|c| c.p_value).collect();
            for (c, holm) in comparisons
                .iter_mut()
                .zip(holm_bonferroni(&p_values, self.params.threshold))
            {
                c.corrected_p_value = Some(holm.corrected_p_value);
                c.significant = holm.corrected_p_value < self.params.threshold && c.delta < 0.0;
            }
        }

        let broken_questions = broken_questions(&matched);
        let passed = !comparisons.iter().any(StrategyComparison::is_regression);
        for c in comparisons.iter().filter(|c| c.is_regression()) {
            warn!(
                dataset = %c.dataset,
                strategy = %c.strategy,
                delta = c.delta,
                p_value = c.corrected_p_value.unwrap_or(c.p_value),
                "Significant regression"
            );
        }

        Ok(RegressionVerdict {
            passed,
            threshold: self.params.threshold,
            holm_corrected: self.params.holm,
            matched_questions: matched.len(),
            comparisons,
            broken_questions,
            total_cost_usd: current.iter().map(BenchmarkOutput::total_cost).sum(),
            total_duration_ms: current.iter().map(BenchmarkOutput::total_duration_ms).sum(),
        })
    }

    fn compare_strategy(&self, matched: &[Matched<'_>], dataset: &str, strategy: &str) -> StrategyComparison {
        let mut baseline_outcomes = Vec::new();
        let mut current_outcomes = Vec::new();
        let mut pairs = Vec::new();
        for m in matched.iter().filter(|m| m.dataset == dataset) {
            let b = m.baseline.consensus_scores.get(strategy).map(|s| s.correct);
            let c = m.current.strategy_correct(strategy);
            baseline_outcomes.extend(b);
            current_outcomes.extend(c);
            if let (Some(b), Some(c)) = (b, c) {
                pairs.push((b, c));
            }
        }

        let (baseline_correct, baseline_total) = tally(&baseline_outcomes);
        let (current_correct, current_total) = tally(&current_outcomes);
        let baseline_interval = wilson_interval(baseline_correct, baseline_total, Z_95);
        let current_interval = wilson_interval(current_correct, current_total, Z_95);
        let delta = current_interval.point - baseline_interval.point;

        let fisher = fisher_exact_one_sided(
            baseline_correct as u64,
            (baseline_total - baseline_correct) as u64,
            current_correct as u64,
            (current_total - current_correct) as u64,
        );

        StrategyComparison {
            strategy: strategy.to_string(),
            dataset: dataset.to_string(),
            pairs: pairs.len(),
            baseline_correct,
            baseline_total,
            current_correct,
            current_total,
            baseline_accuracy: baseline_interval.point,
            current_accuracy: current_interval.point,
            delta,
            p_value: fisher.p_value,
            corrected_p_value: None,
            odds_ratio: fisher.odds_ratio,
            significant: fisher.p_value < self.params.threshold && delta < 0.0,
            mcnemar_p_value: mcnemar_test(&pairs).p_value,
            bootstrap: paired_bootstrap_seeded(&pairs, &self.params.bootstrap),
            baseline_interval,
            current_interval,
        }
    }
}

/// `(correct, total)`
fn tally(outcomes: &[bool]) -> (usize, usize) {
    (outcomes.iter().filter(|&&ok| ok).count(), outcomes.len())
}

/// Questions correct in the baseline and incorrect now, once per strategy.
fn broken_questions(matched: &[Matched<'_>]) -> Vec<BrokenQuestion> {
    let mut broken = Vec::new();
    for m in matched {
        for (strategy, baseline_score) in &m.baseline.consensus_scores {
            let Some(current_score) = m.current.consensus_scores.get(strategy) else {
                continue;
            };
            if baseline_score.correct && !current_score.correct {
                broken.push(BrokenQuestion {
                    question_id: m.current.question_id.clone(),
                    dataset: m.dataset.to_string(),
                    strategy: strategy.clone(),
                    expected: m.baseline.ground_truth.clone(),
                    baseline_answer: m
                        .baseline
                        .consensus_answers
                        .get(strategy)
                        .cloned()
                        .or_else(|| baseline_score.predicted.clone()),
                    current_answer: m
                        .current
                        .consensus
                        .get(strategy)
                        .map(|c| c.answer.clone())
                        .or_else(|| current_score.predicted.clone()),
                });
            }
        }
    }
    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_domain::{
        ConsensusAnswer, ConsensusStrategyKind, EvaluatorKind, ModelSpec, RawResponse, ScoredResult,
    };
    use std::collections::BTreeMap;

    fn run(id: &str, outcomes: &[(&str, bool)]) -> QuestionRun {
        let spec: ModelSpec = "a:x".parse().unwrap();
        QuestionRun {
            question_id: id.to_string(),
            prompt: format!("prompt {}", id),
            ground_truth: "42".to_string(),
            category: None,
            responses: vec![RawResponse::success("a:x", &spec, "42", 10).with_usage(Some(5), Some(0.5))],
            consensus: outcomes
                .iter()
                .map(|(s, ok)| (s.to_string(), ConsensusAnswer::new(if *ok { "42" } else { "41" }, 5)))
                .collect(),
            model_scores: BTreeMap::new(),
            consensus_scores: outcomes
                .iter()
                .map(|(s, ok)| {
                    let predicted = if *ok { "42" } else { "41" };
                    (s.to_string(), ScoredResult::new(*ok, "42", Some(predicted.to_string())))
                })
                .collect(),
            duration_ms: 100,
        }
    }

    /// `n` questions where the first `correct` are right under `strategy`.
    fn output(dataset: &str, strategy: &str, n: usize, correct: usize) -> BenchmarkOutput {
        let mut output = BenchmarkOutput::new(
            dataset,
            EvaluatorKind::Numeric,
            vec!["a:x".parse().unwrap()],
            vec![ConsensusStrategyKind::Standard],
        );
        for i in 0..n {
            output.push(run(&format!("q{}", i), &[(strategy, i < correct)]));
        }
        output
    }

    fn baseline(outputs: &[BenchmarkOutput]) -> GoldenBaseline {
        GoldenBaseline::from_outputs("quick", "abc123", outputs)
    }

    #[test]
    fn test_no_overlap_is_an_error() {
        let base = baseline(&[output("gsm8k", "standard", 5, 5)]);
        let current = output("other", "standard", 5, 5);
        let err = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &[current])
            .unwrap_err();
        assert_eq!(
            err,
            RegressionError::NoOverlap {
                tier: "quick".to_string()
            }
        );
    }

    #[test]
    fn test_significant_drop_fails() {
        let base = baseline(&[output("gsm8k", "standard", 10, 8)]);
        let current = output("gsm8k", "standard", 10, 3);
        let verdict = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &[current])
            .unwrap();

        assert!(!verdict.passed);
        assert_eq!(verdict.matched_questions, 10);
        let row = &verdict.comparisons[0];
        assert_eq!((row.baseline_correct, row.current_correct), (8, 3));
        assert!((row.delta + 0.5).abs() < 1e-12);
        assert!((row.p_value - 0.034_889).abs() < 1e-5);
        assert!((row.odds_ratio - 56.0 / 6.0).abs() < 1e-9);
        assert!(row.significant);
        assert_eq!(row.pairs, 10);
        assert!(row.mcnemar_p_value > 0.0 && row.mcnemar_p_value < 1.0);
        assert!(row.bootstrap.upper < 0.0);
    }

    #[test]
    fn test_broken_questions_listed_once_with_answers() {
        let base = baseline(&[output("gsm8k", "standard", 10, 8)]);
        let current = output("gsm8k", "standard", 10, 3);
        let verdict = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &[current])
            .unwrap();

        let broken: Vec<&str> = verdict
            .broken_for("standard")
            .map(|b| b.question_id.as_str())
            .collect();
        assert_eq!(broken, vec!["q3", "q4", "q5", "q6", "q7"]);
        let first = &verdict.broken_questions[0];
        assert_eq!(first.baseline_answer.as_deref(), Some("42"));
        assert_eq!(first.current_answer.as_deref(), Some("41"));
        assert_eq!(first.expected, "42");
    }

    #[test]
    fn test_improvement_passes() {
        let base = baseline(&[output("gsm8k", "standard", 10, 3)]);
        let current = output("gsm8k", "standard", 10, 8);
        let verdict = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &[current])
            .unwrap();
        assert!(verdict.passed);
        assert!(verdict.comparisons[0].delta > 0.0);
        assert!(!verdict.comparisons[0].significant);
        assert!(verdict.broken_questions.is_empty());
    }

    #[test]
    fn test_small_drop_not_significant() {
        let base = baseline(&[output("gsm8k", "standard", 10, 8)]);
        let current = output("gsm8k", "standard", 10, 7);
        let verdict = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &[current])
            .unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.broken_questions.len(), 1);
    }

    #[test]
    fn test_holm_correction_can_clear_borderline_regression() {
        let base = baseline(&[
            output("gsm8k", "standard", 10, 8),
            output("gpqa", "standard", 10, 5),
        ]);
        let current = vec![
            output("gsm8k", "standard", 10, 3),
            output("gpqa", "standard", 10, 5),
        ];
        let raw = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &current)
            .unwrap();
        assert!(!raw.passed);

        let params = RegressionParams {
            holm: true,
            ..RegressionParams::default()
        };
        let corrected = CompareRegressionUseCase::new(params)
            .execute(&base, &current)
            .unwrap();
        assert!(corrected.holm_corrected);
        let gsm = corrected.comparisons.iter().find(|c| c.dataset == "gsm8k").unwrap();
        assert!((gsm.corrected_p_value.unwrap() - 2.0 * 0.034_889).abs() < 1e-4);
        assert!(corrected.passed);
    }

    #[test]
    fn test_totals_come_from_current_runs() {
        let base = baseline(&[output("gsm8k", "standard", 4, 4)]);
        let current = output("gsm8k", "standard", 4, 4);
        let verdict = CompareRegressionUseCase::new(RegressionParams::default())
            .execute(&base, &[current])
            .unwrap();
        assert!((verdict.total_cost_usd - 2.0).abs() < 1e-9);
        assert_eq!(verdict.total_duration_ms, 400);
    }
}
