//! Console output formatter for benchmark reports

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use quorum_domain::stats::ProportionInterval;
use quorum_domain::{
    AccuracyRow, BenchmarkOutput, EnsembleSummary, ModelSpec, RegressionVerdict,
    StrategyComparison,
};

/// Broken questions listed per strategy before eliding the rest
const MAX_BROKEN_LISTED: usize = 10;

/// Longest answer excerpt shown for a broken question
const MAX_ANSWER_CHARS: usize = 60;

/// Formats benchmark reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a regression verdict: one row per strategy, then the
    /// questions each regressed strategy broke.
    pub fn format_verdict(verdict: &RegressionVerdict) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Regression Check"));
        output.push('\n');
        output.push_str(&format!(
            "{} {} matched questions, threshold p < {}{}\n",
            "Baseline:".cyan().bold(),
            verdict.matched_questions,
            verdict.threshold,
            if verdict.holm_corrected {
                " (Holm-Bonferroni)"
            } else {
                ""
            }
        ));

        output.push_str(&Self::section_header("Strategies"));
        output.push_str(&format!(
            "{:<12} {:<14} {:>17} {:>17} {:>8} {:>9}  {}\n",
            "dataset", "strategy", "baseline", "current", "delta", "p", "status"
        ));
        for comparison in &verdict.comparisons {
            output.push_str(&Self::comparison_row(comparison));
            output.push('\n');
        }

        for comparison in verdict.regressions() {
            output.push_str(&Self::section_header(&format!(
                "Broken: {} / {}",
                comparison.dataset, comparison.strategy
            )));
            let broken: Vec<_> = verdict
                .broken_for(&comparison.strategy)
                .filter(|b| b.dataset == comparison.dataset)
                .collect();
            for b in broken.iter().take(MAX_BROKEN_LISTED) {
                output.push_str(&format!(
                    "  {} expected {}, was {}, now {}\n",
                    b.question_id.bold(),
                    b.expected,
                    Self::excerpt(b.baseline_answer.as_deref()),
                    Self::excerpt(b.current_answer.as_deref()).red()
                ));
            }
            if broken.len() > MAX_BROKEN_LISTED {
                output.push_str(&format!(
                    "  {}\n",
                    format!("... and {} more", broken.len() - MAX_BROKEN_LISTED).dimmed()
                ));
            }
        }

        output.push_str(&format!(
            "\n{} ${:.4}, {}\n",
            "Current run cost:".dimmed(),
            verdict.total_cost_usd,
            Self::duration(verdict.total_duration_ms)
        ));
        let result = if verdict.passed {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        output.push_str(&format!("{} {}\n", "Result:".bold(), result));
        output.push_str(&Self::footer());

        output
    }

    fn comparison_row(c: &StrategyComparison) -> String {
        let p = c.corrected_p_value.unwrap_or(c.p_value);
        let status = if c.is_regression() {
            "REGRESSED".red().bold()
        } else if c.delta > 0.0 {
            "improved".green()
        } else {
            "ok".normal()
        };
        let delta = format!("{:+.1}pp", c.delta * 100.0);
        let delta = if c.delta < 0.0 {
            delta.yellow()
        } else {
            delta.normal()
        };
        format!(
            "{:<12} {:<14} {:>17} {:>17} {:>8} {:>9.4}  {}",
            c.dataset,
            c.strategy,
            Self::fraction(c.baseline_correct, c.baseline_total),
            Self::fraction(c.current_correct, c.current_total),
            delta,
            p,
            status
        )
    }

    /// Format a single-run summary: member and strategy accuracies with
    /// Wilson intervals, then paired comparisons against the best member.
    pub fn format_summary(summary: &EnsembleSummary) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Ensemble Summary"));
        output.push('\n');
        output.push_str(&format!(
            "{} {} ({} questions)\n",
            "Dataset:".cyan().bold(),
            summary.dataset,
            summary.questions
        ));

        output.push_str(&Self::section_header("Models"));
        for row in &summary.models {
            let best = summary.best_model.as_deref() == Some(row.name.as_str());
            output.push_str(&Self::accuracy_row(row, best));
        }

        output.push_str(&Self::section_header("Strategies"));
        for row in &summary.strategies {
            output.push_str(&Self::accuracy_row(row, false));
        }
        if let Some(majority) = &summary.mechanical_majority {
            output.push_str(&Self::accuracy_row(majority, false));
        }
        output.push_str(&Self::accuracy_row(&summary.oracle, false));

        if !summary.comparisons.is_empty() {
            output.push_str(&Self::section_header("Against best model"));
            for c in &summary.comparisons {
                let delta = c.bootstrap.observed_delta * 100.0;
                let line = format!(
                    "  {:<14} vs {:<28} {:+.1}pp [{:+.1}, {:+.1}] McNemar p={:.4} (n={})\n",
                    c.strategy,
                    c.baseline_model,
                    delta,
                    c.bootstrap.lower * 100.0,
                    c.bootstrap.upper * 100.0,
                    c.mcnemar_p_value,
                    c.pairs
                );
                if c.bootstrap.excludes_zero() {
                    output.push_str(&line.bold().to_string());
                } else {
                    output.push_str(&line);
                }
            }
        }

        output.push_str(&format!(
            "\n{} {:.1}%\n",
            "Response errors:".dimmed(),
            summary.response_error_rate * 100.0
        ));
        output.push_str(&format!(
            "{} ${:.4}, {}\n",
            "Cost:".dimmed(),
            summary.total_cost_usd,
            Self::duration(summary.total_duration_ms)
        ));
        output.push_str(&Self::footer());

        output
    }

    fn accuracy_row(row: &AccuracyRow, highlight: bool) -> String {
        let name = if highlight {
            format!("{} *", row.name).yellow().bold()
        } else {
            row.name.normal()
        };
        format!(
            "  {:<32} {:>9} {}\n",
            name,
            Self::fraction(row.correct, row.total),
            Self::interval(&row.interval).dimmed()
        )
    }

    /// Short confirmation after a run finishes
    pub fn format_run_complete(output: &BenchmarkOutput, path: &std::path::Path) -> String {
        let errors: usize = output
            .runs
            .iter()
            .map(|r| r.responses.iter().filter(|resp| !resp.is_success()).count())
            .sum();
        let mut text = format!(
            "{} {} questions of {} written to {}\n",
            "Done:".green().bold(),
            output.runs.len(),
            output.dataset,
            path.display()
        );
        if errors > 0 {
            text.push_str(&format!(
                "{} {} ensemble responses failed\n",
                "Warning:".yellow().bold(),
                errors
            ));
        }
        text.push_str(&format!(
            "{} ${:.4}, {}\n",
            "Cost:".dimmed(),
            output.total_cost(),
            Self::duration(output.total_duration_ms())
        ));
        text
    }

    /// One model per line
    pub fn format_models(models: &[ModelSpec]) -> String {
        let mut output = format!("{} ({})\n", "Available models".cyan().bold(), models.len());
        for model in models {
            output.push_str(&format!("  {}\n", model));
        }
        output
    }

    fn fraction(correct: usize, total: usize) -> String {
        if total == 0 {
            return "-".to_string();
        }
        format!(
            "{}/{} {:>5.1}%",
            correct,
            total,
            correct as f64 / total as f64 * 100.0
        )
    }

    fn interval(interval: &ProportionInterval) -> String {
        format!(
            "[{:.1}, {:.1}]",
            interval.lower * 100.0,
            interval.upper * 100.0
        )
    }

    fn excerpt(answer: Option<&str>) -> String {
        match answer {
            Some(a) => {
                let flat = a.split_whitespace().collect::<Vec<_>>().join(" ");
                quorum_domain::core::string::truncate(&flat, MAX_ANSWER_CHARS)
            }
            None => "(none)".to_string(),
        }
    }

    fn duration(ms: u64) -> String {
        if ms >= 60_000 {
            format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000)
        } else {
            format!("{:.1}s", ms as f64 / 1000.0)
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_verdict(&self, verdict: &RegressionVerdict) -> String {
        Self::format_verdict(verdict)
    }

    fn format_summary(&self, summary: &EnsembleSummary) -> String {
        Self::format_summary(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::OutputFormat;
    use crate::output::formatter::formatter_for;
    use quorum_domain::BrokenQuestion;
    use quorum_domain::stats::{BootstrapResult, Z_95, wilson_interval};

    fn bootstrap(delta: f64) -> BootstrapResult {
        BootstrapResult {
            observed_delta: delta,
            mean_delta: delta,
            lower: delta - 0.1,
            upper: delta + 0.1,
            iterations: 100,
            confidence: 0.95,
        }
    }

    fn comparison(strategy: &str, current: usize, significant: bool) -> StrategyComparison {
        StrategyComparison {
            strategy: strategy.to_string(),
            dataset: "gsm8k".to_string(),
            pairs: 10,
            baseline_correct: 8,
            baseline_total: 10,
            current_correct: current,
            current_total: 10,
            baseline_accuracy: 0.8,
            current_accuracy: current as f64 / 10.0,
            delta: current as f64 / 10.0 - 0.8,
            p_value: if significant { 0.0349 } else { 0.5 },
            corrected_p_value: None,
            odds_ratio: 1.0,
            significant,
            mcnemar_p_value: 0.06,
            bootstrap: bootstrap(current as f64 / 10.0 - 0.8),
            baseline_interval: wilson_interval(8, 10, Z_95),
            current_interval: wilson_interval(current, 10, Z_95),
        }
    }

    fn verdict() -> RegressionVerdict {
        RegressionVerdict {
            passed: false,
            threshold: 0.05,
            holm_corrected: false,
            matched_questions: 10,
            comparisons: vec![comparison("elo", 3, true), comparison("standard", 8, false)],
            broken_questions: vec![BrokenQuestion {
                question_id: "q4".to_string(),
                dataset: "gsm8k".to_string(),
                strategy: "elo".to_string(),
                expected: "42".to_string(),
                baseline_answer: Some("42".to_string()),
                current_answer: Some("The answer is\n41".to_string()),
            }],
            total_cost_usd: 0.25,
            total_duration_ms: 90_500,
        }
    }

    fn row(name: &str, correct: usize, total: usize) -> AccuracyRow {
        AccuracyRow {
            name: name.to_string(),
            correct,
            total,
            interval: wilson_interval(correct, total, Z_95),
        }
    }

    #[test]
    fn test_format_verdict_lists_regressions() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format_verdict(&verdict());
        assert!(text.contains("REGRESSED"));
        assert!(text.contains("Broken: gsm8k / elo"));
        assert!(text.contains("q4 expected 42, was 42, now The answer is 41"));
        assert!(!text.contains("Broken: gsm8k / standard"));
        assert!(text.contains("FAILED"));
        assert!(text.contains("1m30s"));
        assert!(text.contains("-50.0pp"));
    }

    #[test]
    fn test_format_summary() {
        colored::control::set_override(false);
        let summary = EnsembleSummary {
            dataset: "gsm8k".to_string(),
            questions: 4,
            models: vec![row("openai:gpt-4.1", 3, 4), row("openai:gpt-4.1#2", 2, 4)],
            strategies: vec![row("elo", 4, 4)],
            oracle: row("oracle", 4, 4),
            mechanical_majority: None,
            best_model: Some("openai:gpt-4.1".to_string()),
            response_error_rate: 0.125,
            comparisons: Vec::new(),
            total_cost_usd: 0.0,
            total_duration_ms: 1500,
        };
        let text = ConsoleFormatter::format_summary(&summary);
        assert!(text.contains("openai:gpt-4.1 *"));
        assert!(text.contains("3/4  75.0%"));
        assert!(text.contains("12.5%"));
        assert!(text.contains("1.5s"));
        assert!(!text.contains("Against best model"));
    }

    #[test]
    fn test_json_formatter_emits_verdict() {
        let json = formatter_for(OutputFormat::Json).format_verdict(&verdict());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["passed"], false);
        assert_eq!(value["comparisons"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_fraction_and_excerpt() {
        assert_eq!(ConsoleFormatter::fraction(0, 0), "-");
        assert_eq!(ConsoleFormatter::fraction(1, 4), "1/4  25.0%");
        assert_eq!(ConsoleFormatter::excerpt(None), "(none)");
    }

    #[test]
    fn test_format_models() {
        colored::control::set_override(false);
        let models = vec![ModelSpec::new("openai", "gpt-4.1")];
        let text = ConsoleFormatter::format_models(&models);
        assert!(text.contains("Available models (1)"));
        assert!(text.contains("  openai:gpt-4.1"));
    }
}
