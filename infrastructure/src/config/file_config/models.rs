//! Ensemble model configuration (`[models]` section)

use super::ConfigValidationError;
use quorum_domain::ModelSpec;
use serde::{Deserialize, Serialize};

/// Role-based model selection
///
/// # Example
///
/// ```toml
/// [models]
/// ensemble = ["openai:gpt-4.1", "anthropic:claude-sonnet-4", "openai:gpt-4.1"]
/// summarizer = "openai:gpt-4.1"   # consensus synthesis
/// judge = "openai:gpt-4.1-mini"   # ELO, majority alignment, open-ended grading
/// ```
///
/// Listing the same model twice gives two independent ensemble members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub ensemble: Vec<String>,
    /// Defaults to the first ensemble member
    pub summarizer: Option<String>,
    /// Defaults to the summarizer
    pub judge: Option<String>,
}

impl FileModelsConfig {
    fn parse(field: &str, value: &str) -> Result<ModelSpec, ConfigValidationError> {
        if value.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName {
                field: field.to_string(),
            });
        }
        value
            .parse()
            .map_err(|e: quorum_domain::DomainError| ConfigValidationError::InvalidModel {
                field: field.to_string(),
                message: e.to_string(),
            })
    }

    pub fn parse_ensemble(&self) -> Result<Vec<ModelSpec>, ConfigValidationError> {
        self.ensemble
            .iter()
            .map(|m| Self::parse("models.ensemble", m))
            .collect()
    }

    pub fn parse_summarizer(&self) -> Result<Option<ModelSpec>, ConfigValidationError> {
        match &self.summarizer {
            Some(m) => Self::parse("models.summarizer", m).map(Some),
            None => Ok(self.parse_ensemble()?.into_iter().next()),
        }
    }

    pub fn parse_judge(&self) -> Result<Option<ModelSpec>, ConfigValidationError> {
        match &self.judge {
            Some(m) => Self::parse("models.judge", m).map(Some),
            None => self.parse_summarizer(),
        }
    }
}
