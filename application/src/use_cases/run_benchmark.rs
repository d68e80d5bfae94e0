//! Run Benchmark use case
//!
//! Drives one dataset through the ensemble with checkpoint-per-question.
//!
//! ```text
//! pending ──(already in accumulator)──▶ skipped
//!    │
//!    └──▶ running ──▶ scored ──▶ appended ──▶ checkpoint saved ──▶ progress
//! ```
//!
//! Resuming is re-running with the accumulator loaded from the last
//! checkpoint: questions already present are reported as skipped and make
//! no provider calls.

use crate::client::ModelClient;
use crate::ports::llm_gateway::PromptRequest;
use crate::ports::progress::{BenchmarkProgressNotifier, QuestionProgress};
use crate::ports::response_cache::ResponseCache;
use crate::ports::run_store::{RunStore, StoreError};
use crate::use_cases::consensus::ConsensusRegistry;
use crate::use_cases::evaluate::EvaluationEngine;
use futures::StreamExt;
use futures::future::join_all;
use quorum_domain::{
    BenchmarkOutput, ConsensusAnswer, ConsensusStrategyKind, ModelSpec,
    Question, QuestionRun, RawResponse, member_keys,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors that abort a benchmark run
#[derive(Error, Debug)]
pub enum RunBenchmarkError {
    #[error("No models configured")]
    NoModels,

    #[error("Strategy {0} is not registered")]
    UnregisteredStrategy(ConsensusStrategyKind),

    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[from] StoreError),
}

/// Input for the RunBenchmark use case
#[derive(Debug, Clone)]
pub struct RunBenchmarkInput {
    pub questions: Vec<Question>,
    pub models: Vec<ModelSpec>,
    pub strategies: Vec<ConsensusStrategyKind>,
    /// Responses kept by ELO before synthesis
    pub top_n: usize,
    /// Questions in flight at once
    pub question_parallelism: usize,
}

impl RunBenchmarkInput {
    pub fn new(questions: Vec<Question>, models: Vec<ModelSpec>, strategies: Vec<ConsensusStrategyKind>) -> Self {
        Self {
            questions,
            models,
            strategies,
            top_n: 3,
            question_parallelism: 4,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_question_parallelism(mut self, parallelism: usize) -> Self {
        self.question_parallelism = parallelism;
        self
    }
}

/// Use case for running a benchmark over one dataset
pub struct RunBenchmarkUseCase {
    client: Arc<ModelClient>,
    consensus: Arc<ConsensusRegistry>,
    evaluation: Arc<EvaluationEngine>,
    cache: Arc<dyn ResponseCache>,
    store: Arc<dyn RunStore>,
}

impl RunBenchmarkUseCase {
    pub fn new(
        client: Arc<ModelClient>,
        consensus: Arc<ConsensusRegistry>,
        evaluation: Arc<EvaluationEngine>,
        cache: Arc<dyn ResponseCache>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            client,
            consensus,
            evaluation,
            cache,
            store,
        }
    }

    /// Process every question not yet in `output`, checkpointing after each.
    pub async fn execute(
        &self,
        input: RunBenchmarkInput,
        mut output: BenchmarkOutput,
        progress: &dyn BenchmarkProgressNotifier,
    ) -> Result<BenchmarkOutput, RunBenchmarkError> {
        if input.models.is_empty() {
            return Err(RunBenchmarkError::NoModels);
        }
        if let Some(kind) = input
            .strategies
            .iter()
            .find(|k| self.consensus.get(**k).is_none())
        {
            return Err(RunBenchmarkError::UnregisteredStrategy(*kind));
        }

        let keys = member_keys(&input.models);
        let total = input.questions.len();

        // Partition: anything already in the accumulator (or repeated in the
        // dataset) is skipped
        let mut seen: HashSet<String> = output.completed_ids().into_iter().map(str::to_string).collect();
        let mut pending = Vec::new();
        let mut skipped = Vec::new();
        for question in &input.questions {
            if seen.insert(question.id.clone()) {
                pending.push(question);
            } else {
                skipped.push(question.id.clone());
            }
        }

        info!(
            dataset = %output.dataset,
            total,
            pending = pending.len(),
            skipped = skipped.len(),
            "Starting benchmark run"
        );
        progress.on_run_start(&output.dataset, total, pending.len());

        let mut completed = 0;
        for question_id in skipped {
            completed += 1;
            progress.on_question_complete(&QuestionProgress {
                question_id,
                skipped: true,
                queued_ms: 0,
                run_ms: 0,
                completed,
                total,
                failed_responses: 0,
            });
        }

        let started = Instant::now();
        let mut runs = futures::stream::iter(pending.into_iter().map(|question| {
            let keys = &keys;
            let input = &input;
            async move {
                let queued_ms = started.elapsed().as_millis() as u64;
                let run_started = Instant::now();
                let run = self.run_question(question, &input.models, keys, input).await;
                (run, queued_ms, run_started.elapsed().as_millis() as u64)
            }
        }))
        .buffer_unordered(input.question_parallelism.max(1));

        while let Some((run, queued_ms, run_ms)) = runs.next().await {
            let question_id = run.question_id.clone();
            let failed_responses = run.responses.iter().filter(|r| !r.is_success()).count();
            output.push(run);
            self.store.save(&output)?;
            if let Err(e) = self.cache.flush() {
                warn!("Response cache flush failed: {}", e);
            }
            completed += 1;
            debug!(question_id = %question_id, completed, total, "Checkpoint written");
            progress.on_question_complete(&QuestionProgress {
                question_id,
                skipped: false,
                queued_ms,
                run_ms,
                completed,
                total,
                failed_responses,
            });
        }
        drop(runs);

        info!(
            dataset = %output.dataset,
            questions = output.runs.len(),
            concurrency = self.client.controller().current_concurrency(),
            "Benchmark run complete"
        );
        progress.on_run_complete(&output);
        Ok(output)
    }

    async fn run_question(
        &self,
        question: &Question,
        models: &[ModelSpec],
        keys: &[String],
        input: &RunBenchmarkInput,
    ) -> QuestionRun {
        let started = Instant::now();

        let responses: Vec<RawResponse> = join_all(
            models
                .iter()
                .zip(keys)
                .map(|(model, key)| self.query_member(key, model, question)),
        )
        .await;

        let inputs = RawResponse::consensus_inputs(&responses);

        let consensus: BTreeMap<String, ConsensusAnswer> = join_all(input.strategies.iter().map(|&kind| {
            let inputs = &inputs;
            async move {
                let t = Instant::now();
                // Presence checked in execute
                let generated = match self.consensus.get(kind) {
                    Some(strategy) => {
                        strategy
                            .generate_consensus(inputs, input.top_n, &question.prompt)
                            .await
                    }
                    None => Default::default(),
                };
                let answer = ConsensusAnswer::new(generated.text, t.elapsed().as_millis() as u64)
                    .with_usage(generated.usage.total_tokens, generated.usage.cost_usd);
                (kind.as_str().to_string(), answer)
            }
        }))
        .await
        .into_iter()
        .collect();

        let scores = self.evaluation.evaluate(question, &responses, &consensus).await;

        QuestionRun {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            ground_truth: question.ground_truth.clone(),
            category: question.category.clone(),
            responses,
            consensus,
            model_scores: scores.model_scores,
            consensus_scores: scores.consensus_scores,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Cached response when available, otherwise a provider call.
    async fn query_member(&self, key: &str, model: &ModelSpec, question: &Question) -> RawResponse {
        if let Some(mut cached) = self.cache.get(key, &question.id) {
            debug!(member = key, question_id = %question.id, "Response cache hit");
            cached.key = key.to_string();
            return cached;
        }

        let started = Instant::now();
        let request = PromptRequest::new(question.prompt.clone());
        match self.client.generate(model, &request).await {
            Ok(generated) => {
                let response = RawResponse::success(
                    key,
                    model,
                    generated.text,
                    started.elapsed().as_millis() as u64,
                )
                .with_usage(generated.usage.total_tokens, generated.usage.cost_usd);
                self.cache.put(key, &question.id, &response);
                response
            }
            Err(e) => {
                warn!(member = key, question_id = %question.id, "Model call failed: {}", e);
                RawResponse::failure(key, model, e.to_string(), started.elapsed().as_millis() as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ScriptedGateway, client};
    use crate::ports::progress::NoProgress;
    use crate::ports::response_cache::{CacheError, NoCache};
    use crate::use_cases::consensus::ConsensusModels;
    use crate::use_cases::evaluate::Evaluator;
    use quorum_domain::EvaluatorKind;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStore {
        saved_sizes: Mutex<Vec<usize>>,
        last: Mutex<Option<BenchmarkOutput>>,
    }

    impl RunStore for MemoryStore {
        fn load(&self) -> Result<Option<BenchmarkOutput>, StoreError> {
            Ok(self.last.lock().unwrap().clone())
        }

        fn save(&self, output: &BenchmarkOutput) -> Result<(), StoreError> {
            self.saved_sizes.lock().unwrap().push(output.runs.len());
            *self.last.lock().unwrap() = Some(output.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<(String, String), RawResponse>>,
    }

    impl ResponseCache for MemoryCache {
        fn get(&self, member_key: &str, question_id: &str) -> Option<RawResponse> {
            self.entries
                .lock()
                .unwrap()
                .get(&(member_key.to_string(), question_id.to_string()))
                .cloned()
        }

        fn put(&self, member_key: &str, question_id: &str, response: &RawResponse) {
            self.entries
                .lock()
                .unwrap()
                .insert((member_key.to_string(), question_id.to_string()), response.clone());
        }

        fn flush(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<QuestionProgress>>,
    }

    impl BenchmarkProgressNotifier for Recorder {
        fn on_run_start(&self, _dataset: &str, _total: usize, _pending: usize) {}
        fn on_question_complete(&self, progress: &QuestionProgress) {
            self.events.lock().unwrap().push(progress.clone());
        }
        fn on_run_complete(&self, _output: &BenchmarkOutput) {}
    }

    /// Members answer 42 except `openai:bad`, which fails; the judge ties
    /// every comparison and scores alignment evenly.
    fn gateway() -> Arc<ScriptedGateway> {
        Arc::new(ScriptedGateway::new(|model, request| match model.model() {
            "bad" => Err(crate::ports::llm_gateway::GatewayError::Http {
                status: 400,
                message: "bad request".to_string(),
            }),
            "judge" if request.prompt.contains("majority position") => {
                Ok(r#"{"scores": [7, 7, 7]}"#.to_string())
            }
            "judge" => Ok("TIE".to_string()),
            "summarizer" => Ok("Final answer: 42".to_string()),
            _ => Ok("The answer is 42".to_string()),
        }))
    }

    fn use_case(
        gateway: Arc<ScriptedGateway>,
        cache: Arc<dyn ResponseCache>,
        store: Arc<MemoryStore>,
    ) -> RunBenchmarkUseCase {
        let client = client(gateway);
        let models = ConsensusModels {
            summarizer: "openai:summarizer".parse().unwrap(),
            judge: "openai:judge".parse().unwrap(),
        };
        let registry = ConsensusRegistry::new(&ConsensusStrategyKind::all(), Arc::clone(&client), &models);
        let evaluation = EvaluationEngine::new(
            Evaluator::new(EvaluatorKind::Numeric, Arc::clone(&client), models.judge.clone()),
            Duration::from_secs(5),
        );
        RunBenchmarkUseCase::new(client, Arc::new(registry), Arc::new(evaluation), cache, store)
    }

    fn models(names: &[&str]) -> Vec<ModelSpec> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    fn questions() -> Vec<Question> {
        vec![
            Question::new("q1", "Q-ONE: 40 + 2?", "42"),
            Question::new("q2", "Q-TWO: 6 * 7?", "42"),
            Question::new("q3", "Q-THREE: 84 / 2?", "42"),
        ]
    }

    fn output(models: &[ModelSpec]) -> BenchmarkOutput {
        BenchmarkOutput::new(
            "arith",
            EvaluatorKind::Numeric,
            models.to_vec(),
            ConsensusStrategyKind::all().to_vec(),
        )
    }

    #[tokio::test]
    async fn test_full_run_checkpoints_every_question() {
        let store = Arc::new(MemoryStore::default());
        let recorder = Recorder::default();
        let members = models(&["openai:m", "openai:m", "openai:n"]);
        let input = RunBenchmarkInput::new(questions(), members.clone(), ConsensusStrategyKind::all().to_vec());

        let result = use_case(gateway(), Arc::new(NoCache), Arc::clone(&store))
            .execute(input, output(&members), &recorder)
            .await
            .unwrap();

        assert_eq!(result.runs.len(), 3);
        assert_eq!(*store.saved_sizes.lock().unwrap(), vec![1, 2, 3]);

        let run = &result.runs[0];
        let keys: Vec<&str> = run.responses.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["openai:m", "openai:m#2", "openai:n"]);
        assert_eq!(run.consensus.len(), 3);
        assert!(run.model_scores.values().all(|s| s.correct));
        assert!(run.consensus_scores["standard"].correct);
        assert!(run.consensus_scores["elo"].correct);
        assert!(run.consensus_scores["majority"].correct);

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| !e.skipped && e.total == 3));
        assert_eq!(events.last().unwrap().completed, 3);
    }

    #[tokio::test]
    async fn test_resume_skips_completed_questions_without_calls() {
        let members = models(&["openai:m", "openai:n", "openai:o"]);
        let first_store = Arc::new(MemoryStore::default());
        let partial = use_case(gateway(), Arc::new(NoCache), Arc::clone(&first_store))
            .execute(
                RunBenchmarkInput::new(questions()[..1].to_vec(), members.clone(), ConsensusStrategyKind::all().to_vec()),
                output(&members),
                &NoProgress,
            )
            .await
            .unwrap();

        let gateway = gateway();
        let recorder = Recorder::default();
        let resumed = use_case(Arc::clone(&gateway), Arc::new(NoCache), Arc::new(MemoryStore::default()))
            .execute(
                RunBenchmarkInput::new(questions(), members.clone(), ConsensusStrategyKind::all().to_vec()),
                partial,
                &recorder,
            )
            .await
            .unwrap();

        assert_eq!(resumed.runs.len(), 3);
        assert_eq!(resumed.runs[0].question_id, "q1");
        let events = recorder.events.lock().unwrap();
        let q1 = events.iter().find(|e| e.question_id == "q1").unwrap();
        assert!(q1.skipped);
        assert_eq!(events.iter().filter(|e| e.skipped).count(), 1);
        assert!(gateway.calls.lock().unwrap().iter().all(|(_, prompt)| !prompt.contains("Q-ONE")));
    }

    #[tokio::test]
    async fn test_cached_responses_make_no_member_calls() {
        let members = models(&["openai:m", "openai:m"]);
        let cache = Arc::new(MemoryCache::default());
        for key in ["openai:m", "openai:m#2"] {
            let spec: ModelSpec = "openai:m".parse().unwrap();
            cache.put(key, "q1", &RawResponse::success(key, &spec, "cached 42", 5));
        }

        let gateway = gateway();
        let result = use_case(Arc::clone(&gateway), cache, Arc::new(MemoryStore::default()))
            .execute(
                RunBenchmarkInput::new(questions()[..1].to_vec(), members.clone(), vec![]),
                output(&members),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(gateway.call_count(), 0);
        assert_eq!(result.runs[0].responses[1].key, "openai:m#2");
        assert_eq!(result.runs[0].responses[1].content, "cached 42");
    }

    #[tokio::test]
    async fn test_failed_member_and_insufficient_elo() {
        let members = models(&["openai:m", "openai:bad", "openai:n"]);
        let result = use_case(gateway(), Arc::new(NoCache), Arc::new(MemoryStore::default()))
            .execute(
                RunBenchmarkInput::new(questions()[..1].to_vec(), members.clone(), ConsensusStrategyKind::all().to_vec()),
                output(&members),
                &NoProgress,
            )
            .await
            .unwrap();

        let run = &result.runs[0];
        assert!(!run.responses[1].is_success());
        assert!(run.responses[1].error.as_deref().unwrap().contains("400"));
        assert_eq!(run.model_scores["openai:bad"], quorum_domain::ScoredResult::failed("42"));
        assert_eq!(run.consensus["elo"].answer, quorum_domain::ELO_INSUFFICIENT_RESPONSES);
        assert!(!run.consensus_scores.contains_key("elo"));
        assert!(run.consensus_scores.contains_key("majority"));
    }

    #[tokio::test]
    async fn test_no_models_is_rejected() {
        let err = use_case(gateway(), Arc::new(NoCache), Arc::new(MemoryStore::default()))
            .execute(
                RunBenchmarkInput::new(questions(), vec![], vec![]),
                output(&[]),
                &NoProgress,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunBenchmarkError::NoModels));
    }
}
