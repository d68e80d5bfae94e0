//! Consensus strategy kinds and sentinel outcomes

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Returned by ELO ranking when fewer than 3 responses succeeded.
pub const ELO_INSUFFICIENT_RESPONSES: &str =
    "Insufficient responses for ELO ranking (minimum 3 required)";

/// Returned by majority voting when fewer than 2 responses succeeded.
pub const MAJORITY_INSUFFICIENT_RESPONSES: &str =
    "Insufficient responses for majority voting (minimum 2 required)";

/// Returned when the summarizer call fails.
pub const SYNTHESIS_FAILED: &str = "Failed to generate consensus response";

/// Whether `answer` is one of the "insufficient responses" sentinels.
///
/// Answers equal to a sentinel are excluded from evaluation.
pub fn is_insufficient_sentinel(answer: &str) -> bool {
    answer == ELO_INSUFFICIENT_RESPONSES || answer == MAJORITY_INSUFFICIENT_RESPONSES
}

/// Available consensus strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusStrategyKind {
    /// Merge all responses into one answer
    Standard,
    /// Rank pairwise with ELO, synthesize the top responses
    Elo,
    /// Score alignment, synthesize the majority position
    Majority,
}

impl ConsensusStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusStrategyKind::Standard => "standard",
            ConsensusStrategyKind::Elo => "elo",
            ConsensusStrategyKind::Majority => "majority",
        }
    }

    pub fn all() -> [ConsensusStrategyKind; 3] {
        [
            ConsensusStrategyKind::Standard,
            ConsensusStrategyKind::Elo,
            ConsensusStrategyKind::Majority,
        ]
    }

    /// Minimum number of successful responses the strategy needs.
    pub fn min_responses(&self) -> usize {
        match self {
            ConsensusStrategyKind::Standard => 1,
            ConsensusStrategyKind::Elo => 3,
            ConsensusStrategyKind::Majority => 2,
        }
    }

    /// Answer given when fewer than [`min_responses`](Self::min_responses)
    /// succeeded. Standard has no sentinel of its own and reports a failed
    /// synthesis, which is scored as incorrect.
    pub fn insufficient_sentinel(&self) -> &'static str {
        match self {
            ConsensusStrategyKind::Standard => SYNTHESIS_FAILED,
            ConsensusStrategyKind::Elo => ELO_INSUFFICIENT_RESPONSES,
            ConsensusStrategyKind::Majority => MAJORITY_INSUFFICIENT_RESPONSES,
        }
    }
}

impl std::fmt::Display for ConsensusStrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsensusStrategyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ConsensusStrategyKind::Standard),
            "elo" => Ok(ConsensusStrategyKind::Elo),
            "majority" | "majority-voting" | "majority_voting" => {
                Ok(ConsensusStrategyKind::Majority)
            }
            other => Err(DomainError::UnknownStrategy(other.to_string())),
        }
    }
}

/// One successful ensemble answer, keyed by its disambiguated member key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleResponse {
    pub key: String,
    pub content: String,
}

impl EnsembleResponse {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }
}
