//! Ensemble summary of a single run file
//!
//! Answers "did the ensemble beat its best member?" for one
//! [`BenchmarkOutput`]: per-member and per-strategy accuracy with Wilson
//! intervals, oracle and mechanical majority ceilings, and a paired
//! comparison of every strategy against the best single model.

use crate::benchmark::entities::{BenchmarkOutput, QuestionRun};
use crate::ensemble::member_keys;
use crate::stats::{
    BootstrapConfig, BootstrapResult, ProportionInterval, Z_95, mcnemar_test,
    paired_bootstrap_seeded, wilson_interval,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyRow {
    pub name: String,
    pub correct: usize,
    pub total: usize,
    pub interval: ProportionInterval,
}

impl AccuracyRow {
    fn from_outcomes(name: impl Into<String>, outcomes: impl IntoIterator<Item = bool>) -> Self {
        let (correct, total) = outcomes
            .into_iter()
            .fold((0, 0), |(c, t), ok| (c + ok as usize, t + 1));
        Self {
            name: name.into(),
            correct,
            total,
            interval: wilson_interval(correct, total, Z_95),
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.interval.point
    }
}

/// Paired comparison of one strategy against the best single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairedComparison {
    pub strategy: String,
    pub baseline_model: String,
    pub pairs: usize,
    pub mcnemar_p_value: f64,
    /// Delta is `strategy - model`
    pub bootstrap: BootstrapResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleSummary {
    pub dataset: String,
    pub questions: usize,
    pub models: Vec<AccuracyRow>,
    pub strategies: Vec<AccuracyRow>,
    /// Fraction of questions where at least one member was correct
    pub oracle: AccuracyRow,
    /// Plurality of extracted answers; deterministic evaluators only
    pub mechanical_majority: Option<AccuracyRow>,
    pub best_model: Option<String>,
    pub response_error_rate: f64,
    pub comparisons: Vec<PairedComparison>,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

impl EnsembleSummary {
    pub fn from_output(output: &BenchmarkOutput, bootstrap: &BootstrapConfig) -> Self {
        let runs = &output.runs;
        let keys = member_keys(&output.models);

        let models: Vec<AccuracyRow> = keys
            .iter()
            .map(|key| AccuracyRow::from_outcomes(key.clone(), runs.iter().filter_map(|r| r.model_correct(key))))
            .collect();

        let strategies: Vec<AccuracyRow> = output
            .scored_strategies()
            .into_iter()
            .map(|name| {
                let outcomes: Vec<bool> = runs.iter().filter_map(|r| r.strategy_correct(&name)).collect();
                AccuracyRow::from_outcomes(name, outcomes)
            })
            .collect();

        let oracle = AccuracyRow::from_outcomes(
            "oracle",
            runs.iter().map(|r| r.model_scores.values().any(|s| s.correct)),
        );

        let mechanical_majority = output.evaluator.is_deterministic().then(|| {
            AccuracyRow::from_outcomes(
                "mechanical-majority",
                runs.iter().map(|r| mechanical_majority_correct(output, r)),
            )
        });

        // Strictly greater keeps the first member on ties
        let best = models.iter().fold(None::<&AccuracyRow>, |best, row| match best {
            Some(b) if row.total == 0 || row.accuracy() <= b.accuracy() => Some(b),
            _ if row.total == 0 => best,
            _ => Some(row),
        });
        let best_model = best.map(|b| b.name.clone());

        let (errors, responses) = runs.iter().flat_map(|r| &r.responses).fold((0, 0), |(e, t), r| {
            (e + (!r.is_success()) as usize, t + 1)
        });
        let response_error_rate = if responses == 0 {
            0.0
        } else {
            errors as f64 / responses as f64
        };

        let comparisons = match &best_model {
            Some(model) => strategies
                .iter()
                .map(|s| compare_to_model(runs, &s.name, model, bootstrap))
                .collect(),
            None => Vec::new(),
        };

        Self {
            dataset: output.dataset.clone(),
            questions: runs.len(),
            models,
            strategies,
            oracle,
            mechanical_majority,
            best_model,
            response_error_rate,
            comparisons,
            total_cost_usd: output.total_cost(),
            total_duration_ms: output.total_duration_ms(),
        }
    }
}

/// Plurality vote over extracted answers; ties go to the earliest answer.
fn mechanical_majority_correct(output: &BenchmarkOutput, run: &QuestionRun) -> bool {
    let mut tally: Vec<(String, usize)> = Vec::new();
    for response in run.responses.iter().filter(|r| r.is_success()) {
        if let Some(answer) = output.evaluator.extract(&response.content) {
            match tally.iter_mut().find(|(a, _)| *a == answer) {
                Some((_, n)) => *n += 1,
                None => tally.push((answer, 1)),
            }
        }
    }
    let winner = tally
        .iter()
        .fold(None::<&(String, usize)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        });
    winner
        .and_then(|(answer, _)| output.evaluator.check(answer, &run.ground_truth))
        .is_some_and(|s| s.correct)
}

fn compare_to_model(
    runs: &[QuestionRun],
    strategy: &str,
    model: &str,
    bootstrap: &BootstrapConfig,
) -> PairedComparison {
    let pairs: Vec<(bool, bool)> = runs
        .iter()
        .filter_map(|r| Some((r.model_correct(model)?, r.strategy_correct(strategy)?)))
        .collect();
    PairedComparison {
        strategy: strategy.to_string(),
        baseline_model: model.to_string(),
        pairs: pairs.len(),
        mcnemar_p_value: mcnemar_test(&pairs).p_value,
        bootstrap: paired_bootstrap_seeded(&pairs, bootstrap),
    }
}
