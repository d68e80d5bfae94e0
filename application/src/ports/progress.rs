//! Progress notification port
//!
//! Defines the interface for reporting progress during a benchmark run.

use quorum_domain::BenchmarkOutput;
use serde::Serialize;

/// Progress record emitted once per question, after its checkpoint is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionProgress {
    pub question_id: String,
    /// True when the question was already present in the accumulator
    pub skipped: bool,
    /// Time spent waiting for a free question slot
    pub queued_ms: u64,
    /// Time spent computing the question
    pub run_ms: u64,
    pub completed: usize,
    pub total: usize,
    /// Ensemble members that returned an error
    pub failed_responses: usize,
}

/// Callback for progress updates during a benchmark run
///
/// Implementations live in the presentation layer (progress bars) and the
/// infrastructure layer (JSONL event log).
pub trait BenchmarkProgressNotifier: Send + Sync {
    /// Called once before any question is processed
    fn on_run_start(&self, dataset: &str, total: usize, pending: usize);

    /// Called for every question, skipped or computed
    fn on_question_complete(&self, progress: &QuestionProgress);

    /// Called after the final checkpoint
    fn on_run_complete(&self, output: &BenchmarkOutput);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl BenchmarkProgressNotifier for NoProgress {
    fn on_run_start(&self, _dataset: &str, _total: usize, _pending: usize) {}
    fn on_question_complete(&self, _progress: &QuestionProgress) {}
    fn on_run_complete(&self, _output: &BenchmarkOutput) {}
}

/// A progress notifier that delegates to multiple inner notifiers.
///
/// ```text
/// RunBenchmarkUseCase.execute(.., &composite)
///                                   |
///              +--------------------+--------------------+
///              |                                         |
///     ProgressReporter (console)              JsonlProgressLogger (file)
/// ```
pub struct CompositeProgressNotifier<'a> {
    delegates: Vec<&'a dyn BenchmarkProgressNotifier>,
}

impl<'a> CompositeProgressNotifier<'a> {
    pub fn new(delegates: Vec<&'a dyn BenchmarkProgressNotifier>) -> Self {
        Self { delegates }
    }
}

/// Macro to delegate a method call to all inner notifiers.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        for d in &$self.delegates {
            d.$method($($arg),*);
        }
    };
}

impl BenchmarkProgressNotifier for CompositeProgressNotifier<'_> {
    fn on_run_start(&self, dataset: &str, total: usize, pending: usize) {
        delegate!(self, on_run_start, dataset, total, pending);
    }

    fn on_question_complete(&self, progress: &QuestionProgress) {
        delegate!(self, on_question_complete, progress);
    }

    fn on_run_complete(&self, output: &BenchmarkOutput) {
        delegate!(self, on_run_complete, output);
    }
}
