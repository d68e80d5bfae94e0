//! Consensus engine
//!
//! Three strategies behind one tagged enum. [`ConsensusRegistry`] is built
//! once per run from the configured strategy kinds and looked up by kind.

mod elo;
mod majority;
mod standard;

pub use elo::{DEFAULT_TOP_N, ELO_K_FACTOR, EloRanking, INITIAL_RATING};
pub use majority::MajorityVoting;
pub use standard::StandardSynthesis;

use crate::client::ModelClient;
use crate::ports::llm_gateway::GeneratedText;
use quorum_domain::{ConsensusStrategyKind, EnsembleResponse, ModelSpec};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The kind's sentinel when fewer than its minimum number of responses
/// succeeded; `None` when the strategy can run.
pub(crate) fn shortfall(
    kind: ConsensusStrategyKind,
    responses: &[EnsembleResponse],
) -> Option<GeneratedText> {
    (responses.len() < kind.min_responses())
        .then(|| GeneratedText::new(kind.insufficient_sentinel()))
}

/// A response with its strategy-specific ranking score (ELO rating or
/// alignment score), highest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResponse {
    pub key: String,
    pub score: f64,
}

/// Models used by the strategies.
#[derive(Debug, Clone)]
pub struct ConsensusModels {
    /// Writes the synthesized answer
    pub summarizer: ModelSpec,
    /// Compares and scores responses
    pub judge: ModelSpec,
}

pub enum ConsensusStrategy {
    Standard(StandardSynthesis),
    Elo(EloRanking),
    Majority(MajorityVoting),
}

impl ConsensusStrategy {
    pub fn new(kind: ConsensusStrategyKind, client: Arc<ModelClient>, models: &ConsensusModels) -> Self {
        let standard = StandardSynthesis::new(Arc::clone(&client), models.summarizer.clone());
        match kind {
            ConsensusStrategyKind::Standard => ConsensusStrategy::Standard(standard),
            ConsensusStrategyKind::Elo => {
                ConsensusStrategy::Elo(EloRanking::new(client, models.judge.clone(), standard))
            }
            ConsensusStrategyKind::Majority => ConsensusStrategy::Majority(MajorityVoting::new(
                client,
                models.judge.clone(),
                models.summarizer.clone(),
            )),
        }
    }

    pub fn kind(&self) -> ConsensusStrategyKind {
        match self {
            ConsensusStrategy::Standard(_) => ConsensusStrategyKind::Standard,
            ConsensusStrategy::Elo(_) => ConsensusStrategyKind::Elo,
            ConsensusStrategy::Majority(_) => ConsensusStrategyKind::Majority,
        }
    }

    /// Synthesize one answer. Never fails: shortfalls return the kind's
    /// sentinel and summarizer failures return the synthesis-failed string.
    pub async fn generate_consensus(
        &self,
        responses: &[EnsembleResponse],
        top_n: usize,
        prompt: &str,
    ) -> GeneratedText {
        match self {
            ConsensusStrategy::Standard(s) => s.synthesize(responses, prompt).await,
            ConsensusStrategy::Elo(s) => s.generate_consensus(responses, top_n, prompt).await,
            ConsensusStrategy::Majority(s) => s.generate_consensus(responses, prompt).await,
        }
    }

    /// Rank responses; `None` for strategies without a ranking.
    pub async fn rank_responses(
        &self,
        responses: &[EnsembleResponse],
        prompt: &str,
    ) -> Option<Vec<RankedResponse>> {
        match self {
            ConsensusStrategy::Standard(_) => None,
            ConsensusStrategy::Elo(s) => Some(s.rank_responses(responses, prompt).await.0),
            ConsensusStrategy::Majority(s) => Some(s.rank_responses(responses, prompt).await.0),
        }
    }
}

/// Strategies built at startup, keyed by kind.
pub struct ConsensusRegistry {
    strategies: BTreeMap<ConsensusStrategyKind, ConsensusStrategy>,
}

impl ConsensusRegistry {
    pub fn new(
        kinds: &[ConsensusStrategyKind],
        client: Arc<ModelClient>,
        models: &ConsensusModels,
    ) -> Self {
        let strategies = kinds
            .iter()
            .map(|&kind| (kind, ConsensusStrategy::new(kind, Arc::clone(&client), models)))
            .collect();
        Self { strategies }
    }

    pub fn get(&self, kind: ConsensusStrategyKind) -> Option<&ConsensusStrategy> {
        self.strategies.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ConsensusStrategyKind> + '_ {
        self.strategies.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsensusStrategy> {
        self.strategies.values()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ScriptedGateway, client};

    fn models() -> ConsensusModels {
        ConsensusModels {
            summarizer: "openai:summarizer".parse().unwrap(),
            judge: "openai:judge".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch_by_kind() {
        let gateway = Arc::new(ScriptedGateway::constant("merged"));
        let registry = ConsensusRegistry::new(
            &[ConsensusStrategyKind::Majority, ConsensusStrategyKind::Standard],
            client(Arc::clone(&gateway)),
            &models(),
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec![ConsensusStrategyKind::Standard, ConsensusStrategyKind::Majority]
        );
        assert!(registry.get(ConsensusStrategyKind::Elo).is_none());

        let standard = registry.get(ConsensusStrategyKind::Standard).unwrap();
        assert_eq!(standard.kind(), ConsensusStrategyKind::Standard);
        let responses = vec![EnsembleResponse::new("a:x", "42")];
        assert!(standard.rank_responses(&responses, "Q?").await.is_none());
        assert_eq!(standard.generate_consensus(&responses, 3, "Q?").await.text, "merged");
    }
}
