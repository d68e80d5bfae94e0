//! Evaluation engine
//!
//! Scores every member response and consensus answer of one question
//! concurrently. Each check runs under its own timeout; a timeout or judge
//! error degrades that single result to an incorrect, unpredicted score.

use crate::client::ModelClient;
use crate::ports::llm_gateway::{GatewayError, PromptRequest};
use futures::future::join_all;
use quorum_domain::evaluation::parse_judge_verdict;
use quorum_domain::{
    ConsensusAnswer, EvaluatorKind, ModelSpec, PromptTemplate, Question, RawResponse,
    ScoredResult, is_insufficient_sentinel,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Open-ended grading through a judge model.
pub struct JudgeGrader {
    client: Arc<ModelClient>,
    judge: ModelSpec,
}

impl JudgeGrader {
    pub fn new(client: Arc<ModelClient>, judge: ModelSpec) -> Self {
        Self { client, judge }
    }

    async fn grade(&self, question: &str, answer: &str, expected: &str) -> Result<ScoredResult, GatewayError> {
        let request = PromptRequest::new(PromptTemplate::judge_prompt(question, expected, answer))
            .with_system(PromptTemplate::judge_system());
        let verdict = self.client.generate_text(&self.judge, &request).await?;
        let correct = parse_judge_verdict(&verdict).unwrap_or(false);
        Ok(ScoredResult::new(correct, expected, Some(answer.trim().to_string())))
    }
}

/// Answer checker selected by [`EvaluatorKind`].
pub enum Evaluator {
    Numeric,
    MultipleChoice,
    Judge(JudgeGrader),
}

impl Evaluator {
    pub fn new(kind: EvaluatorKind, client: Arc<ModelClient>, judge: ModelSpec) -> Self {
        match kind {
            EvaluatorKind::Numeric => Evaluator::Numeric,
            EvaluatorKind::MultipleChoice => Evaluator::MultipleChoice,
            EvaluatorKind::OpenEnded => Evaluator::Judge(JudgeGrader::new(client, judge)),
        }
    }

    pub fn kind(&self) -> EvaluatorKind {
        match self {
            Evaluator::Numeric => EvaluatorKind::Numeric,
            Evaluator::MultipleChoice => EvaluatorKind::MultipleChoice,
            Evaluator::Judge(_) => EvaluatorKind::OpenEnded,
        }
    }

    pub async fn check(&self, question: &str, answer: &str, expected: &str) -> Result<ScoredResult, GatewayError> {
        match self {
            Evaluator::Numeric | Evaluator::MultipleChoice => {
                // Deterministic kinds always produce a result
                Ok(self
                    .kind()
                    .check(answer, expected)
                    .unwrap_or_else(|| ScoredResult::failed(expected)))
            }
            Evaluator::Judge(grader) => grader.grade(question, answer, expected).await,
        }
    }
}

/// Scores for one question, keyed like [`quorum_domain::QuestionRun`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionScores {
    pub model_scores: BTreeMap<String, ScoredResult>,
    pub consensus_scores: BTreeMap<String, ScoredResult>,
}

enum Target {
    Model(String),
    Strategy(String),
}

pub struct EvaluationEngine {
    evaluator: Evaluator,
    call_timeout: Duration,
}

impl EvaluationEngine {
    pub fn new(evaluator: Evaluator, call_timeout: Duration) -> Self {
        Self {
            evaluator,
            call_timeout,
        }
    }

    pub fn kind(&self) -> EvaluatorKind {
        self.evaluator.kind()
    }

    /// Score one answer, degrading timeouts and errors to a failed result.
    pub async fn score(&self, question: &str, answer: &str, expected: &str) -> ScoredResult {
        match tokio::time::timeout(self.call_timeout, self.evaluator.check(question, answer, expected)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Evaluation failed: {}", e);
                ScoredResult::failed(expected)
            }
            Err(_) => {
                warn!(timeout_ms = self.call_timeout.as_millis() as u64, "Evaluation timed out");
                ScoredResult::failed(expected)
            }
        }
    }

    /// Score every response and every non-sentinel consensus answer.
    ///
    /// Errored responses score as failed without a check.
    pub async fn evaluate(
        &self,
        question: &Question,
        responses: &[RawResponse],
        consensus: &BTreeMap<String, ConsensusAnswer>,
    ) -> QuestionScores {
        let expected = question.ground_truth.as_str();

        let mut targets: Vec<(Target, Option<&str>)> = responses
            .iter()
            .map(|r| {
                let answer = r.is_success().then_some(r.content.as_str());
                (Target::Model(r.key.clone()), answer)
            })
            .collect();
        targets.extend(
            consensus
                .iter()
                .filter(|(_, c)| !is_insufficient_sentinel(&c.answer))
                .map(|(name, c)| (Target::Strategy(name.clone()), Some(c.answer.as_str()))),
        );

        let results = join_all(targets.iter().map(|(_, answer)| async move {
            match answer {
                Some(answer) => self.score(&question.prompt, answer, expected).await,
                None => ScoredResult::failed(expected),
            }
        }))
        .await;

        let mut scores = QuestionScores::default();
        for ((target, _), result) in targets.into_iter().zip(results) {
            match target {
                Target::Model(key) => scores.model_scores.insert(key, result),
                Target::Strategy(name) => scores.consensus_scores.insert(name, result),
            };
        }
        debug!(
            question_id = %question.id,
            models = scores.model_scores.len(),
            strategies = scores.consensus_scores.len(),
            "Question evaluated"
        );
        scores
    }
}
