//! Regression configuration (`[regression]` section)

use quorum_application::RegressionParams;
use quorum_domain::stats::BootstrapConfig;
use serde::{Deserialize, Serialize};

/// ```toml
/// [regression]
/// threshold = 0.05
/// holm = false
/// bootstrap_iterations = 5000
/// bootstrap_seed = 42
/// confidence = 0.95
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegressionConfig {
    pub threshold: f64,
    pub holm: bool,
    pub bootstrap_iterations: usize,
    /// Unset draws a fresh seed per comparison
    pub bootstrap_seed: Option<u64>,
    pub confidence: f64,
}

impl Default for FileRegressionConfig {
    fn default() -> Self {
        let params = RegressionParams::default();
        Self {
            threshold: params.threshold,
            holm: params.holm,
            bootstrap_iterations: params.bootstrap.iterations,
            bootstrap_seed: params.bootstrap.seed,
            confidence: params.bootstrap.confidence,
        }
    }
}

impl FileRegressionConfig {
    pub fn bootstrap(&self) -> BootstrapConfig {
        BootstrapConfig {
            iterations: self.bootstrap_iterations,
            confidence: self.confidence,
            seed: self.bootstrap_seed,
        }
    }

    pub fn to_params(&self) -> RegressionParams {
        RegressionParams {
            threshold: self.threshold,
            holm: self.holm,
            bootstrap: self.bootstrap(),
        }
    }
}
