//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. They deserialize directly
//! and convert to application types after [`FileConfig::validate`].

mod consensus;
mod models;
mod regression;
mod runner;
mod storage;

pub use consensus::{FileConsensusConfig, FileEvaluationConfig};
pub use models::FileModelsConfig;
pub use regression::FileRegressionConfig;
pub use runner::FileRunnerConfig;
pub use storage::{FileCacheConfig, FileProviderConfig};

use quorum_application::RunnerParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field}: model name cannot be empty")]
    EmptyModelName { field: String },

    #[error("{field}: {message}")]
    InvalidModel { field: String, message: String },

    #[error("runner.{field} cannot be 0")]
    ZeroValue { field: &'static str },

    #[error("runner.concurrency_min ({min}) is greater than runner.concurrency_max ({max})")]
    MinAboveMax { min: usize, max: usize },

    #[error("runner.concurrency_initial ({initial}) is outside [{min}, {max}]")]
    InitialOutOfBounds { initial: usize, min: usize, max: usize },

    #[error("consensus.strategies: unknown strategy '{0}' (expected standard, elo or majority)")]
    UnknownStrategy(String),

    #[error("evaluation.evaluator: unknown evaluator '{0}' (expected numeric, multiple-choice or open-ended)")]
    UnknownEvaluator(String),

    #[error("regression.{field} must be strictly between 0 and 1, got {value}")]
    OutOfUnitInterval { field: &'static str, value: f64 },

    #[error("regression.bootstrap_iterations cannot be 0")]
    ZeroBootstrapIterations,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub models: FileModelsConfig,
    pub runner: FileRunnerConfig,
    pub consensus: FileConsensusConfig,
    pub evaluation: FileEvaluationConfig,
    pub regression: FileRegressionConfig,
    pub cache: FileCacheConfig,
    pub provider: FileProviderConfig,
}

impl FileConfig {
    /// Validate the whole configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.models.parse_ensemble()?;
        self.models.parse_summarizer()?;
        self.models.parse_judge()?;

        let runner = &self.runner;
        for (field, value) in [
            ("concurrency_initial", runner.concurrency_initial),
            ("concurrency_min", runner.concurrency_min),
            ("concurrency_max", runner.concurrency_max),
            ("question_parallelism", runner.question_parallelism),
            ("retry_attempts", runner.retry_attempts as usize),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroValue { field });
            }
        }
        if runner.concurrency_min > runner.concurrency_max {
            return Err(ConfigValidationError::MinAboveMax {
                min: runner.concurrency_min,
                max: runner.concurrency_max,
            });
        }
        if !(runner.concurrency_min..=runner.concurrency_max).contains(&runner.concurrency_initial) {
            return Err(ConfigValidationError::InitialOutOfBounds {
                initial: runner.concurrency_initial,
                min: runner.concurrency_min,
                max: runner.concurrency_max,
            });
        }

        self.consensus.parse_strategies()?;
        self.evaluation.parse_evaluator()?;

        let regression = &self.regression;
        for (field, value) in [
            ("threshold", regression.threshold),
            ("confidence", regression.confidence),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigValidationError::OutOfUnitInterval { field, value });
            }
        }
        if regression.bootstrap_iterations == 0 {
            return Err(ConfigValidationError::ZeroBootstrapIterations);
        }

        Ok(())
    }

    pub fn to_runner_params(&self) -> RunnerParams {
        RunnerParams::default()
            .with_concurrency(self.runner.concurrency())
            .with_retry(self.runner.retry())
            .with_evaluation_timeout(Duration::from_secs(self.runner.evaluation_timeout_secs))
            .with_question_parallelism(self.runner.question_parallelism)
            .with_top_n(self.consensus.top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[models]
ensemble = ["openai:gpt-4.1", "openai:gpt-4.1", "anthropic:claude-sonnet-4"]
summarizer = "openai:gpt-4.1"
judge = "openai:gpt-4.1-mini"

[runner]
concurrency_initial = 8
concurrency_max = 32
question_parallelism = 6

[consensus]
strategies = ["standard", "majority"]
top_n = 2

[evaluation]
evaluator = "numeric"

[regression]
threshold = 0.01
holm = true
bootstrap_seed = 7

[cache]
ensemble_dir = ".cache/ensemble"

[provider]
base_url = "http://localhost:8080/v1"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.models.parse_ensemble().unwrap().len(), 3);
        assert_eq!(config.consensus.parse_strategies().unwrap().len(), 2);
        assert_eq!(config.regression.to_params().bootstrap.seed, Some(7));
        assert!(config.regression.holm);
        assert_eq!(
            config.cache.ensemble_dir.as_deref(),
            Some(std::path::Path::new(".cache/ensemble"))
        );
        assert_eq!(config.provider.base_url, "http://localhost:8080/v1");

        let params = config.to_runner_params();
        assert_eq!(params.concurrency.initial, 8);
        assert_eq!(params.concurrency.max, 32);
        assert_eq!(params.question_parallelism, 6);
        assert_eq!(params.top_n, 2);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_model_name() {
        let config: FileConfig = toml::from_str("[models]\nensemble = [\"\"]\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelName { .. })
        ));
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let zero: FileConfig = toml::from_str("[runner]\nconcurrency_min = 0\n").unwrap();
        assert_eq!(
            zero.validate(),
            Err(ConfigValidationError::ZeroValue {
                field: "concurrency_min"
            })
        );

        let inverted: FileConfig =
            toml::from_str("[runner]\nconcurrency_min = 8\nconcurrency_max = 4\n").unwrap();
        assert_eq!(
            inverted.validate(),
            Err(ConfigValidationError::MinAboveMax { min: 8, max: 4 })
        );

        let outside: FileConfig =
            toml::from_str("[runner]\nconcurrency_initial = 20\nconcurrency_max = 16\n").unwrap();
        assert!(matches!(
            outside.validate(),
            Err(ConfigValidationError::InitialOutOfBounds { initial: 20, .. })
        ));
    }

    #[test]
    fn test_validate_unknown_names() {
        let strategy: FileConfig =
            toml::from_str("[consensus]\nstrategies = [\"borda\"]\n").unwrap();
        assert_eq!(
            strategy.validate(),
            Err(ConfigValidationError::UnknownStrategy("borda".into()))
        );

        let evaluator: FileConfig = toml::from_str("[evaluation]\nevaluator = \"exact\"\n").unwrap();
        assert_eq!(
            evaluator.validate(),
            Err(ConfigValidationError::UnknownEvaluator("exact".into()))
        );
    }

    #[test]
    fn test_validate_regression_ranges() {
        let threshold: FileConfig = toml::from_str("[regression]\nthreshold = 1.5\n").unwrap();
        assert!(matches!(
            threshold.validate(),
            Err(ConfigValidationError::OutOfUnitInterval {
                field: "threshold",
                ..
            })
        ));

        let iterations: FileConfig =
            toml::from_str("[regression]\nbootstrap_iterations = 0\n").unwrap();
        assert_eq!(
            iterations.validate(),
            Err(ConfigValidationError::ZeroBootstrapIterations)
        );
    }
}
