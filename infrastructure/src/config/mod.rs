//! Configuration file loading for quorum-bench
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. Built-in defaults
//! 2. Global: `$XDG_CONFIG_HOME/quorum-bench/config.toml`
//! 3. Project: `./quorum-bench.toml`
//! 4. `--config <path>`
//! 5. `QUORUM_BENCH_*` environment variables (`__` separates sections)

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileCacheConfig, FileConfig, FileConsensusConfig,
    FileEvaluationConfig, FileModelsConfig, FileProviderConfig, FileRegressionConfig,
    FileRunnerConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
