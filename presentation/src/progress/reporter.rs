//! Progress reporting for benchmark runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use quorum_application::{BenchmarkProgressNotifier, QuestionProgress};
use quorum_domain::BenchmarkOutput;
use std::sync::{Mutex, PoisonError};

/// Reports run progress with an indicatif bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn run_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line status for a finished question
fn question_status(progress: &QuestionProgress) -> String {
    if progress.skipped {
        format!("{} {} (cached)", "-".dimmed(), progress.question_id)
    } else if progress.failed_responses > 0 {
        format!(
            "{} {} ({} failed responses)",
            "!".yellow(),
            progress.question_id,
            progress.failed_responses
        )
    } else {
        format!("{} {}", "v".green(), progress.question_id)
    }
}

impl BenchmarkProgressNotifier for ProgressReporter {
    fn on_run_start(&self, dataset: &str, total: usize, pending: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::run_style());
        pb.set_prefix(dataset.to_string());
        pb.set_message(format!("{} pending", pending));
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_question_complete(&self, progress: &QuestionProgress) {
        self.with_bar(|pb| {
            pb.set_message(question_status(progress));
            pb.set_position(progress.completed as u64);
        });
    }

    fn on_run_complete(&self, output: &BenchmarkOutput) {
        let taken = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(pb) = taken {
            pb.finish_with_message(format!(
                "{} {} questions, ${:.4}",
                "complete!".green(),
                output.runs.len(),
                output.total_cost()
            ));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl BenchmarkProgressNotifier for SimpleProgress {
    fn on_run_start(&self, dataset: &str, total: usize, pending: usize) {
        println!(
            "{} {} ({} questions, {} pending)",
            "->".cyan(),
            dataset.bold(),
            total,
            pending
        );
    }

    fn on_question_complete(&self, progress: &QuestionProgress) {
        if progress.skipped {
            return;
        }
        println!(
            "  [{}/{}] {} {}ms",
            progress.completed,
            progress.total,
            question_status(progress),
            progress.run_ms
        );
    }

    fn on_run_complete(&self, output: &BenchmarkOutput) {
        println!(
            "{} {} questions in {}ms",
            "v".green(),
            output.runs.len(),
            output.total_duration_ms()
        );
    }
}
