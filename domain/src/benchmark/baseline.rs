//! Golden baseline snapshot

use crate::benchmark::entities::BenchmarkOutput;
use crate::consensus::ConsensusStrategyKind;
use crate::core::model::ModelSpec;
use crate::evaluation::{EvaluatorKind, ScoredResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration a baseline tier was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierConfig {
    pub datasets: Vec<String>,
    pub models: Vec<ModelSpec>,
    pub strategies: Vec<ConsensusStrategyKind>,
    pub evaluators: BTreeMap<String, EvaluatorKind>,
}

/// Baseline result for one pinned question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineQuestionResult {
    pub question_id: String,
    pub dataset: String,
    pub ground_truth: String,
    /// Keyed by member key
    pub model_scores: BTreeMap<String, ScoredResult>,
    /// Keyed by strategy name
    pub consensus_scores: BTreeMap<String, ScoredResult>,
    /// Raw consensus text, kept for regression triage
    #[serde(default)]
    pub consensus_answers: BTreeMap<String, String>,
}

/// A named, committed, write-once snapshot used as the regression reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenBaseline {
    pub tier: String,
    pub created_at: DateTime<Utc>,
    pub commit: String,
    pub config: TierConfig,
    pub question_ids: Vec<String>,
    pub results: Vec<BaselineQuestionResult>,
}

impl GoldenBaseline {
    /// Derive a baseline from completed run outputs, one per dataset.
    ///
    /// Question ids are pinned in run order.
    pub fn from_outputs(
        tier: impl Into<String>,
        commit: impl Into<String>,
        outputs: &[BenchmarkOutput],
    ) -> Self {
        let mut models: Vec<ModelSpec> = Vec::new();
        let mut strategies: Vec<ConsensusStrategyKind> = Vec::new();
        let mut evaluators = BTreeMap::new();
        let mut question_ids = Vec::new();
        let mut results = Vec::new();

        for output in outputs {
            evaluators.insert(output.dataset.clone(), output.evaluator);
            for model in &output.models {
                if !models.contains(model) {
                    models.push(model.clone());
                }
            }
            for strategy in &output.strategies {
                if !strategies.contains(strategy) {
                    strategies.push(*strategy);
                }
            }
            for run in &output.runs {
                question_ids.push(run.question_id.clone());
                results.push(BaselineQuestionResult {
                    question_id: run.question_id.clone(),
                    dataset: output.dataset.clone(),
                    ground_truth: run.ground_truth.clone(),
                    model_scores: run.model_scores.clone(),
                    consensus_scores: run.consensus_scores.clone(),
                    consensus_answers: run
                        .consensus
                        .iter()
                        .map(|(k, v)| (k.clone(), v.answer.clone()))
                        .collect(),
                });
            }
        }

        Self {
            tier: tier.into(),
            created_at: Utc::now(),
            commit: commit.into(),
            config: TierConfig {
                datasets: outputs.iter().map(|o| o.dataset.clone()).collect(),
                models,
                strategies,
                evaluators,
            },
            question_ids,
            results,
        }
    }

    pub fn result(&self, dataset: &str, question_id: &str) -> Option<&BaselineQuestionResult> {
        self.results
            .iter()
            .find(|r| r.dataset == dataset && r.question_id == question_id)
    }
}
