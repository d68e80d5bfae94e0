//! Benchmark run entities

use crate::consensus::{ConsensusStrategyKind, EnsembleResponse};
use crate::core::model::ModelSpec;
use crate::evaluation::{EvaluatorKind, ScoredResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One ensemble member's answer to one question.
///
/// `content` is empty when `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    /// Disambiguated member key (`provider:model`, `provider:model#2`, …)
    pub key: String,
    pub provider: String,
    pub model: String,
    pub content: String,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawResponse {
    /// Successful responses as consensus input, in ensemble order.
    pub fn consensus_inputs(responses: &[RawResponse]) -> Vec<EnsembleResponse> {
        responses
            .iter()
            .filter(|r| r.is_success())
            .map(|r| EnsembleResponse::new(r.key.clone(), r.content.clone()))
            .collect()
    }

    pub fn success(
        key: impl Into<String>,
        spec: &ModelSpec,
        content: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            key: key.into(),
            provider: spec.provider().to_string(),
            model: spec.model().to_string(),
            content: content.into(),
            latency_ms,
            tokens: None,
            cost: None,
            error: None,
        }
    }

    pub fn failure(
        key: impl Into<String>,
        spec: &ModelSpec,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            key: key.into(),
            provider: spec.provider().to_string(),
            model: spec.model().to_string(),
            content: String::new(),
            latency_ms,
            tokens: None,
            cost: None,
            error: Some(error.into()),
        }
    }

    pub fn with_usage(mut self, tokens: Option<u64>, cost: Option<f64>) -> Self {
        self.tokens = tokens;
        self.cost = cost;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A synthesized answer produced by one consensus strategy.
///
/// `answer` may be an "insufficient responses" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusAnswer {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub duration_ms: u64,
}

impl ConsensusAnswer {
    pub fn new(answer: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            answer: answer.into(),
            tokens: None,
            cost: None,
            duration_ms,
        }
    }

    pub fn with_usage(mut self, tokens: Option<u64>, cost: Option<f64>) -> Self {
        self.tokens = tokens;
        self.cost = cost;
        self
    }
}

/// Fully computed result for one question. Never mutated after it is
/// appended to a [`BenchmarkOutput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRun {
    pub question_id: String,
    pub prompt: String,
    pub ground_truth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub responses: Vec<RawResponse>,
    /// Keyed by strategy name
    pub consensus: BTreeMap<String, ConsensusAnswer>,
    /// Keyed by member key
    pub model_scores: BTreeMap<String, ScoredResult>,
    /// Keyed by strategy name; sentinel answers are absent
    pub consensus_scores: BTreeMap<String, ScoredResult>,
    pub duration_ms: u64,
}

impl QuestionRun {
    pub fn model_correct(&self, key: &str) -> Option<bool> {
        self.model_scores.get(key).map(|s| s.correct)
    }

    pub fn strategy_correct(&self, strategy: &str) -> Option<bool> {
        self.consensus_scores.get(strategy).map(|s| s.correct)
    }

    /// Sum of response and consensus costs; unknown costs count as zero.
    pub fn total_cost(&self) -> f64 {
        let responses: f64 = self.responses.iter().filter_map(|r| r.cost).sum();
        let consensus: f64 = self.consensus.values().filter_map(|c| c.cost).sum();
        responses + consensus
    }
}

/// The output accumulator of one benchmark run, written as a checkpoint
/// after every question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkOutput {
    pub dataset: String,
    pub evaluator: EvaluatorKind,
    pub models: Vec<ModelSpec>,
    pub strategies: Vec<ConsensusStrategyKind>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub runs: Vec<QuestionRun>,
}

impl BenchmarkOutput {
    pub fn new(
        dataset: impl Into<String>,
        evaluator: EvaluatorKind,
        models: Vec<ModelSpec>,
        strategies: Vec<ConsensusStrategyKind>,
    ) -> Self {
        let now = Utc::now();
        Self {
            dataset: dataset.into(),
            evaluator,
            models,
            strategies,
            started_at: now,
            updated_at: now,
            runs: Vec::new(),
        }
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.runs.iter().any(|r| r.question_id == question_id)
    }

    pub fn completed_ids(&self) -> HashSet<&str> {
        self.runs.iter().map(|r| r.question_id.as_str()).collect()
    }

    /// Append a completed run and bump `updated_at`.
    pub fn push(&mut self, run: QuestionRun) {
        self.runs.push(run);
        self.updated_at = Utc::now();
    }

    pub fn get(&self, question_id: &str) -> Option<&QuestionRun> {
        self.runs.iter().find(|r| r.question_id == question_id)
    }

    pub fn total_cost(&self) -> f64 {
        self.runs.iter().map(QuestionRun::total_cost).sum()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.runs.iter().map(|r| r.duration_ms).sum()
    }

    /// Every strategy name with at least one score, sorted.
    pub fn scored_strategies(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .runs
            .iter()
            .flat_map(|r| r.consensus_scores.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
