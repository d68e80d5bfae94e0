//! Consensus and evaluation configuration (`[consensus]`, `[evaluation]`)

use super::ConfigValidationError;
use quorum_domain::{ConsensusStrategyKind, EvaluatorKind};
use serde::{Deserialize, Serialize};

/// ```toml
/// [consensus]
/// strategies = ["standard", "elo", "majority"]
/// top_n = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    pub strategies: Vec<String>,
    /// Responses merged by ELO; 0 falls back to 3
    pub top_n: usize,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            strategies: ConsensusStrategyKind::all()
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
            top_n: 3,
        }
    }
}

impl FileConsensusConfig {
    /// Parsed strategy kinds with duplicates removed, in listed order.
    pub fn parse_strategies(&self) -> Result<Vec<ConsensusStrategyKind>, ConfigValidationError> {
        let mut kinds = Vec::new();
        for name in &self.strategies {
            let kind: ConsensusStrategyKind = name
                .parse()
                .map_err(|_| ConfigValidationError::UnknownStrategy(name.clone()))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}

/// ```toml
/// [evaluation]
/// evaluator = "numeric"   # numeric | multiple-choice | open-ended
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEvaluationConfig {
    /// Overrides the dataset's own evaluator when set
    pub evaluator: Option<String>,
}

impl FileEvaluationConfig {
    pub fn parse_evaluator(&self) -> Result<Option<EvaluatorKind>, ConfigValidationError> {
        self.evaluator
            .as_deref()
            .map(|name| {
                name.parse()
                    .map_err(|_| ConfigValidationError::UnknownEvaluator(name.to_string()))
            })
            .transpose()
    }
}
