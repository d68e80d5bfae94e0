//! Model value object identifying one ensemble member

use crate::core::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Provider used when a model string carries no `provider:` prefix.
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// One ensemble member (Value Object)
///
/// Identified by a provider and a provider-specific model id. The textual
/// form is `provider:model`, which is also the base identity used when
/// disambiguating duplicate ensemble members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelSpec {
    provider: String,
    model: String,
}

impl ModelSpec {
    /// Create a new model spec
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Provider identifier (e.g. `openai`)
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Model identifier (e.g. `gpt-4.1`)
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base identity used for keys: `provider:model`
    pub fn identity(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

impl std::str::FromStr for ModelSpec {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::InvalidModel("model name cannot be empty".into()));
        }
        match s.split_once(':') {
            Some((provider, model)) => {
                if provider.trim().is_empty() || model.trim().is_empty() {
                    return Err(DomainError::InvalidModel(s.to_string()));
                }
                Ok(Self::new(provider.trim(), model.trim()))
            }
            None => Ok(Self::new(UNKNOWN_PROVIDER, s)),
        }
    }
}

impl Serialize for ModelSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModelSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
