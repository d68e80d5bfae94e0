//! Output formatter trait

use crate::cli::commands::OutputFormat;
use crate::output::console::ConsoleFormatter;
use quorum_domain::{EnsembleSummary, RegressionVerdict};
use serde::Serialize;

/// Trait for rendering benchmark reports
pub trait OutputFormatter {
    /// Render a regression verdict
    fn format_verdict(&self, verdict: &RegressionVerdict) -> String;

    /// Render a single-run summary
    fn format_summary(&self, summary: &EnsembleSummary) -> String;
}

/// Pretty-printed JSON, for CI pipelines
pub struct JsonFormatter;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

impl OutputFormatter for JsonFormatter {
    fn format_verdict(&self, verdict: &RegressionVerdict) -> String {
        to_json(verdict)
    }

    fn format_summary(&self, summary: &EnsembleSummary) -> String {
        to_json(summary)
    }
}

/// The formatter for a `--format` choice
pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
