//! CLI entrypoint for quorum-bench
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use quorum_application::{
    AdaptiveConcurrencyController, BenchmarkProgressNotifier, CompareRegressionUseCase,
    CompositeProgressNotifier, ConsensusModels, ConsensusRegistry, EvaluationEngine, Evaluator,
    LlmGateway, ModelClient, NoCache, NoProgress, RegressionParams, ResponseCache,
    RunBenchmarkInput, RunBenchmarkUseCase, RunStore, RunnerParams,
};
use quorum_domain::{
    BenchmarkOutput, ConsensusStrategyKind, EnsembleSummary, EvaluatorKind, GoldenBaseline,
    ModelSpec,
};
use quorum_infrastructure::{
    BaselineStore, ConfigLoader, FileConfig, FileResponseCache, GatewayConfig, JsonRunStore,
    JsonlProgressLogger, OpenAiCompatibleGateway, TieredResponseCache, load_dataset,
    load_outputs,
};
use quorum_presentation::{
    BaselineCommand, BaselineCreateArgs, Cli, Command, CompareArgs, ConsoleFormatter,
    ProgressReporter, RunArgs, SimpleProgress, SummaryArgs, ValidateKeyArgs, formatter_for,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting quorum-bench");

    let config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Command::Run(args) => run(&config, args, cli.quiet).await,
        Command::Compare(args) => compare(&config, args),
        Command::Baseline(BaselineCommand::Create(args)) => create_baseline(args),
        Command::Summary(args) => summary(&config, args),
        Command::Models => list_models(&config).await,
        Command::ValidateKey(args) => validate_key(&config, args).await,
        Command::ShowConfig => show_config(&config, cli.config.as_deref()),
    }
}

fn gateway(config: &FileConfig) -> Result<Arc<OpenAiCompatibleGateway>> {
    let provider = &config.provider;
    let api_key = provider.resolve_api_key();
    if api_key.is_none() {
        warn!(env = %provider.api_key_env, "No API key configured");
    }
    let gateway = OpenAiCompatibleGateway::new(GatewayConfig {
        base_url: provider.base_url.clone(),
        api_key,
        max_tokens: provider.max_tokens,
        request_timeout: Duration::from_secs(provider.request_timeout_secs),
    })?;
    Ok(Arc::new(gateway))
}

/// Command-line values win over the configuration file.
fn ensemble(config: &FileConfig, args: &RunArgs) -> Result<Vec<ModelSpec>> {
    let models = if args.models.is_empty() {
        config.models.parse_ensemble()?
    } else {
        args.models
            .iter()
            .map(|m| m.parse::<ModelSpec>())
            .collect::<Result<Vec<_>, _>>()?
    };
    if models.is_empty() {
        bail!("No ensemble models. Pass --model or set [models].ensemble in the config file.");
    }
    Ok(models)
}

fn strategies(config: &FileConfig, args: &RunArgs) -> Result<Vec<ConsensusStrategyKind>> {
    if args.strategies.is_empty() {
        return Ok(config.consensus.parse_strategies()?);
    }
    let mut kinds: Vec<ConsensusStrategyKind> = Vec::new();
    for name in &args.strategies {
        let kind: ConsensusStrategyKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn optional_spec(cli: Option<&str>, configured: Option<ModelSpec>) -> Result<Option<ModelSpec>> {
    match cli {
        Some(s) => Ok(Some(s.parse()?)),
        None => Ok(configured),
    }
}

fn runner_params(config: &FileConfig, args: &RunArgs) -> RunnerParams {
    let mut params = config.to_runner_params();
    if let Some(n) = args.parallelism {
        params = params.with_question_parallelism(n as usize);
    }
    if let Some(n) = args.top_n {
        params = params.with_top_n(n);
    }
    if let Some(n) = args.concurrency {
        let mut concurrency = params.concurrency;
        concurrency.initial = n as usize;
        concurrency.max = concurrency.max.max(n as usize);
        params = params.with_concurrency(concurrency);
    }
    params
}

fn response_cache(
    config: &FileConfig,
    args: &RunArgs,
    dataset: &str,
) -> Arc<dyn ResponseCache> {
    if args.no_cache {
        return Arc::new(NoCache);
    }
    let mut layers: Vec<Arc<dyn ResponseCache>> = Vec::new();
    if let Some(dir) = &config.cache.baseline_dir {
        layers.push(Arc::new(FileResponseCache::baseline(dir, dataset, &args.cache_params)));
    }
    if let Some(dir) = &config.cache.ensemble_dir {
        layers.push(Arc::new(FileResponseCache::ensemble(dir, dataset, &args.cache_params)));
    }
    if layers.is_empty() {
        return Arc::new(NoCache);
    }
    info!(layers = layers.len(), "Response cache enabled");
    Arc::new(TieredResponseCache::new(layers))
}

async fn run(config: &FileConfig, args: RunArgs, quiet: bool) -> Result<()> {
    let mut dataset = load_dataset(&args.dataset)
        .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;
    if let Some(limit) = args.limit {
        dataset.questions.truncate(limit);
    }

    let models = ensemble(config, &args)?;
    let strategies = strategies(config, &args)?;
    let evaluator: EvaluatorKind = match &args.evaluator {
        Some(name) => name.parse()?,
        None => match dataset.evaluator {
            Some(kind) => kind,
            None => config
                .evaluation
                .parse_evaluator()?
                .unwrap_or(EvaluatorKind::Numeric),
        },
    };

    let summarizer = optional_spec(args.summarizer.as_deref(), config.models.parse_summarizer()?)?
        .unwrap_or_else(|| models[0].clone());
    let judge = optional_spec(args.judge.as_deref(), config.models.parse_judge()?)?
        .unwrap_or_else(|| summarizer.clone());
    let params = runner_params(config, &args);

    // === Dependency Injection ===
    let gateway: Arc<dyn LlmGateway> = gateway(config)?;
    let controller = Arc::new(AdaptiveConcurrencyController::new(params.concurrency));
    let client = Arc::new(ModelClient::new(gateway, controller, params.retry));
    let consensus = Arc::new(ConsensusRegistry::new(
        &strategies,
        Arc::clone(&client),
        &ConsensusModels { summarizer, judge: judge.clone() },
    ));
    let evaluation = Arc::new(EvaluationEngine::new(
        Evaluator::new(evaluator, Arc::clone(&client), judge),
        params.evaluation_timeout,
    ));
    let cache = response_cache(config, &args, &dataset.name);
    let store = Arc::new(JsonRunStore::new(&args.output));

    let fresh = BenchmarkOutput::new(&dataset.name, evaluator, models.clone(), strategies.clone());
    let output = match store.load()? {
        Some(existing) => {
            ensure_resumable(&existing, &fresh)
                .with_context(|| format!("Cannot resume {}; choose another --output", args.output.display()))?;
            info!(completed = existing.runs.len(), "Resuming from checkpoint");
            existing
        }
        None => fresh,
    };

    let input = RunBenchmarkInput::new(dataset.questions, models, strategies)
        .with_top_n(params.top_n)
        .with_question_parallelism(params.question_parallelism);

    let use_case = RunBenchmarkUseCase::new(client, consensus, evaluation, cache, store);

    let events = args.events.as_ref().and_then(|p| JsonlProgressLogger::new(p));
    if args.events.is_some() && events.is_none() {
        warn!("Progress event log could not be opened; continuing without it");
    }
    let reporter = ProgressReporter::new();
    let console: &dyn BenchmarkProgressNotifier = if quiet {
        &NoProgress
    } else if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        &reporter
    } else {
        &SimpleProgress
    };
    let mut delegates: Vec<&dyn BenchmarkProgressNotifier> = vec![console];
    if let Some(logger) = &events {
        delegates.push(logger);
    }
    let progress = CompositeProgressNotifier::new(delegates);

    let output = use_case.execute(input, output, &progress).await?;

    if !quiet {
        print!("{}", ConsoleFormatter::format_run_complete(&output, &args.output));
    }
    Ok(())
}

/// A checkpoint is only resumed by a run with the same dataset, evaluator,
/// ensemble and strategy list.
fn ensure_resumable(existing: &BenchmarkOutput, fresh: &BenchmarkOutput) -> Result<()> {
    if existing.dataset != fresh.dataset {
        bail!("checkpoint holds dataset {}, not {}", existing.dataset, fresh.dataset);
    }
    if existing.evaluator != fresh.evaluator {
        bail!("checkpoint was scored with {}, not {}", existing.evaluator, fresh.evaluator);
    }
    if existing.models != fresh.models {
        bail!("checkpoint holds a different ensemble");
    }
    if existing.strategies != fresh.strategies {
        bail!("checkpoint holds a different strategy list");
    }
    Ok(())
}

fn compare(config: &FileConfig, args: CompareArgs) -> Result<()> {
    let baseline = BaselineStore::new(&args.baseline).load()?;
    let current = load_outputs(&args.current)?;

    let mut params: RegressionParams = config.regression.to_params();
    if let Some(threshold) = args.threshold {
        params.threshold = threshold;
    }
    if args.holm {
        params.holm = true;
    }
    if let Some(iterations) = args.bootstrap_iterations {
        params.bootstrap.iterations = iterations as usize;
    }
    if args.seed.is_some() {
        params.bootstrap.seed = args.seed;
    }

    let verdict = CompareRegressionUseCase::new(params).execute(&baseline, &current)?;
    println!("{}", formatter_for(args.format).format_verdict(&verdict));

    if !verdict.passed {
        let names: Vec<String> = verdict
            .regressions()
            .map(|c| format!("{}/{}", c.dataset, c.strategy))
            .collect();
        bail!("Regression detected in {}", names.join(", "));
    }
    Ok(())
}

fn create_baseline(args: BaselineCreateArgs) -> Result<()> {
    let outputs = load_outputs(&args.runs)?;
    let baseline = GoldenBaseline::from_outputs(&args.tier, &args.commit, &outputs);
    if baseline.question_ids.is_empty() {
        bail!("The run files contain no completed questions");
    }
    BaselineStore::new(&args.output).create(&baseline, args.force)?;
    println!(
        "Baseline '{}' pinned {} questions from {} at {}",
        baseline.tier,
        baseline.question_ids.len(),
        baseline.commit,
        args.output.display()
    );
    Ok(())
}

fn summary(config: &FileConfig, args: SummaryArgs) -> Result<()> {
    let outputs = load_outputs(std::slice::from_ref(&args.run))?;
    let Some(output) = outputs.first() else {
        bail!("{} holds no run", args.run.display());
    };
    let summary = EnsembleSummary::from_output(output, &config.regression.bootstrap());
    println!("{}", formatter_for(args.format).format_summary(&summary));
    Ok(())
}

async fn list_models(config: &FileConfig) -> Result<()> {
    let models = gateway(config)?.available_models().await?;
    print!("{}", ConsoleFormatter::format_models(&models));
    Ok(())
}

async fn validate_key(config: &FileConfig, args: ValidateKeyArgs) -> Result<()> {
    let Some(key) = args.key.or_else(|| config.provider.resolve_api_key()) else {
        bail!(
            "No API key to validate. Pass --key or set {}.",
            config.provider.api_key_env
        );
    };
    if gateway(config)?.validate_api_key(&args.provider, &key).await? {
        println!("API key for {} is valid", args.provider);
        Ok(())
    } else {
        bail!("API key for {} was rejected", args.provider)
    }
}

fn show_config(config: &FileConfig, explicit: Option<&Path>) -> Result<()> {
    println!("Configuration sources (highest priority first):");
    println!(
        "  {:<9} {}* environment variables",
        "Env",
        quorum_infrastructure::config::ENV_PREFIX
    );
    for (label, path, found) in ConfigLoader::config_sources(explicit) {
        let status = if found { "loaded" } else { "not found" };
        println!("  {:<9} {} ({})", label, path.display(), status);
    }
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
