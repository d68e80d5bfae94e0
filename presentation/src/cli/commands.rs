//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored tables for the terminal
    Text,
    /// Pretty-printed JSON
    Json,
}

/// CLI arguments for quorum-bench
#[derive(Parser, Debug)]
#[command(name = "quorum-bench")]
#[command(author, version, about = "Benchmark LLM ensembles and detect consensus regressions")]
#[command(long_about = r#"
quorum-bench sends every dataset question to an ensemble of models, merges
their answers with consensus strategies (standard, elo, majority), scores
everything against ground truth and compares runs against golden baselines.

Configuration files are loaded from (later sources win):
1. $XDG_CONFIG_HOME/quorum-bench/config.toml   Global config
2. ./quorum-bench.toml                         Project config
3. --config <path>                             Explicit config file
4. QUORUM_BENCH_<SECTION>__<KEY>               Environment overrides

Example:
  quorum-bench run --dataset gsm8k.jsonl --output runs/gsm8k.json -m openai:gpt-4.1 -m openai:gpt-4.1 -m anthropic:claude-sonnet-4
  quorum-bench baseline create --tier quick --commit $(git rev-parse HEAD) --run runs/gsm8k.json --output baselines/quick.json
  quorum-bench compare --baseline baselines/quick.json --current runs/gsm8k.json --holm
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the ensemble over a dataset, checkpointing after every question
    Run(RunArgs),
    /// Compare run files against a golden baseline
    Compare(CompareArgs),
    /// Manage golden baselines
    #[command(subcommand)]
    Baseline(BaselineCommand),
    /// Summarize one run file: members vs. strategies vs. oracle
    Summary(SummaryArgs),
    /// List models offered by the provider
    Models,
    /// Check that an API key is accepted by the provider
    ValidateKey(ValidateKeyArgs),
    /// Show configuration sources and the merged configuration
    ShowConfig,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dataset file (JSON or JSONL)
    #[arg(short, long, value_name = "PATH")]
    pub dataset: PathBuf,

    /// Run file; an existing file is resumed
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Ensemble member, repeatable; repeats sample the same model again
    #[arg(short, long = "model", value_name = "PROVIDER:MODEL")]
    pub models: Vec<String>,

    /// Consensus strategy, repeatable (standard, elo, majority)
    #[arg(short, long = "strategy", value_name = "NAME")]
    pub strategies: Vec<String>,

    /// Model used to synthesize consensus answers
    #[arg(long, value_name = "PROVIDER:MODEL")]
    pub summarizer: Option<String>,

    /// Model used for pairwise ranking, alignment scoring and grading
    #[arg(long, value_name = "PROVIDER:MODEL")]
    pub judge: Option<String>,

    /// Evaluator (numeric, multiple-choice, open-ended); overrides the dataset
    #[arg(short, long, value_name = "KIND")]
    pub evaluator: Option<String>,

    /// Responses merged by ELO consensus
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Questions processed at once
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub parallelism: Option<u32>,

    /// Initial provider concurrency
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: Option<u32>,

    /// Only the first N questions of the dataset
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Free-form tag separating cache partitions (e.g. temperature settings)
    #[arg(long, value_name = "TAG", default_value = "default")]
    pub cache_params: String,

    /// Do not read or write the response caches
    #[arg(long)]
    pub no_cache: bool,

    /// Write progress events as JSONL
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Golden baseline file
    #[arg(short, long, value_name = "PATH")]
    pub baseline: PathBuf,

    /// Run files to compare, repeatable
    #[arg(short, long, value_name = "PATH", required = true)]
    pub current: Vec<PathBuf>,

    /// Significance threshold for the one-sided Fisher test
    #[arg(long, value_name = "P", value_parser = parse_probability)]
    pub threshold: Option<f64>,

    /// Apply Holm-Bonferroni correction across strategies
    #[arg(long)]
    pub holm: bool,

    /// Bootstrap resamples
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub bootstrap_iterations: Option<u32>,

    /// Bootstrap seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum BaselineCommand {
    /// Pin the results of completed run files as a golden baseline
    Create(BaselineCreateArgs),
}

#[derive(Args, Debug)]
pub struct BaselineCreateArgs {
    /// Tier name (e.g. quick, full)
    #[arg(short, long)]
    pub tier: String,

    /// Commit the baseline was produced from
    #[arg(long)]
    pub commit: String,

    /// Completed run files, one per dataset
    #[arg(short, long = "run", value_name = "PATH", required = true)]
    pub runs: Vec<PathBuf>,

    /// Baseline file to create
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Overwrite an existing baseline
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Run file
    #[arg(value_name = "PATH")]
    pub run: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ValidateKeyArgs {
    /// Provider name shown in messages
    #[arg(long, default_value = "default")]
    pub provider: String,

    /// Key to check; defaults to the configured key
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,
}

/// A probability strictly between 0 and 1
fn parse_probability(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("{} must be strictly between 0 and 1", value))
    }
}
