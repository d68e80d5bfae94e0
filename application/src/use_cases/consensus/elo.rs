//! ELO ranking: pairwise judge comparisons, then synthesis of the top responses

use super::{RankedResponse, shortfall};
use super::standard::StandardSynthesis;
use crate::client::ModelClient;
use crate::ports::llm_gateway::{GeneratedText, PromptRequest};
use futures::future::join_all;
use quorum_domain::consensus::{PairwisePreference, parse_pairwise_preference};
use quorum_domain::{
    ConsensusStrategyKind, EnsembleResponse, ModelSpec, PromptTemplate, TokenUsage,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub const INITIAL_RATING: f64 = 1500.0;
pub const ELO_K_FACTOR: f64 = 32.0;
/// Responses passed on to synthesis when the caller gives `top_n = 0`
pub const DEFAULT_TOP_N: usize = 3;

pub struct EloRanking {
    client: Arc<ModelClient>,
    judge: ModelSpec,
    standard: StandardSynthesis,
}

impl EloRanking {
    pub fn new(client: Arc<ModelClient>, judge: ModelSpec, standard: StandardSynthesis) -> Self {
        Self {
            client,
            judge,
            standard,
        }
    }

    pub async fn generate_consensus(
        &self,
        responses: &[EnsembleResponse],
        top_n: usize,
        prompt: &str,
    ) -> GeneratedText {
        if let Some(sentinel) = shortfall(ConsensusStrategyKind::Elo, responses) {
            return sentinel;
        }

        let (ranking, judge_usage) = self.rank_responses(responses, prompt).await;
        let top_n = if top_n == 0 { DEFAULT_TOP_N } else { top_n };
        let top: Vec<EnsembleResponse> = ranking
            .iter()
            .take(top_n.min(ranking.len()))
            .filter_map(|r| responses.iter().find(|x| x.key == r.key).cloned())
            .collect();
        debug!(
            selected = ?top.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            "ELO top responses"
        );

        let mut out = self.standard.synthesize(&top, prompt).await;
        out.usage = judge_usage.merge(out.usage);
        out
    }

    /// Compare every unordered pair once. Judge calls run concurrently and
    /// ratings are updated in pair order; ties in rating keep input order.
    pub async fn rank_responses(
        &self,
        responses: &[EnsembleResponse],
        prompt: &str,
    ) -> (Vec<RankedResponse>, TokenUsage) {
        let n = responses.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();

        let verdicts = join_all(
            pairs
                .iter()
                .map(|&(i, j)| self.compare(prompt, &responses[i], &responses[j])),
        )
        .await;

        let mut ratings = vec![INITIAL_RATING; n];
        let mut usage = TokenUsage::default();
        for (&(i, j), (preference, call_usage)) in pairs.iter().zip(verdicts) {
            usage = usage.merge(call_usage);
            update_ratings(&mut ratings, i, j, preference.score_for_a());
        }

        let mut ranked: Vec<RankedResponse> = responses
            .iter()
            .zip(ratings)
            .map(|(r, score)| RankedResponse {
                key: r.key.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        (ranked, usage)
    }

    async fn compare(
        &self,
        prompt: &str,
        a: &EnsembleResponse,
        b: &EnsembleResponse,
    ) -> (PairwisePreference, TokenUsage) {
        let request = PromptRequest::new(PromptTemplate::pairwise_prompt(prompt, &a.content, &b.content))
            .with_system(PromptTemplate::pairwise_system());
        match self.client.generate(&self.judge, &request).await {
            Ok(generated) => (parse_pairwise_preference(&generated.text), generated.usage),
            Err(e) => {
                warn!(a = %a.key, b = %b.key, "Pairwise comparison failed, counting as tie: {}", e);
                (PairwisePreference::Tie, TokenUsage::default())
            }
        }
    }
}

/// Standard ELO update for one game; `score_a` is 1 (A wins), 0.5 or 0.
pub fn update_ratings(ratings: &mut [f64], a: usize, b: usize, score_a: f64) {
    let (ra, rb) = (ratings[a], ratings[b]);
    let expected_a = 1.0 / (1.0 + 10f64.powf((rb - ra) / 400.0));
    let delta = ELO_K_FACTOR * (score_a - expected_a);
    ratings[a] = ra + delta;
    ratings[b] = rb - delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ScriptedGateway, client};
    use crate::ports::llm_gateway::GatewayError;
    use quorum_domain::ELO_INSUFFICIENT_RESPONSES;

    /// Judge prefers whichever side contains "GOOD"; summarizer echoes "synth".
    fn gateway() -> Arc<ScriptedGateway> {
        Arc::new(ScriptedGateway::new(|model, request| {
            if model.model() == "summarizer" {
                return Ok("synth".to_string());
            }
            let (a_side, b_side) = request
                .prompt
                .split_once("--- Response B ---")
                .unwrap_or((request.prompt.as_str(), ""));
            let verdict = match (a_side.contains("GOOD"), b_side.contains("GOOD")) {
                (true, false) => "A",
                (false, true) => "B",
                _ => "TIE",
            };
            Ok(verdict.to_string())
        }))
    }

    fn elo(gateway: Arc<ScriptedGateway>) -> EloRanking {
        let client = client(gateway);
        let standard = StandardSynthesis::new(Arc::clone(&client), "openai:summarizer".parse().unwrap());
        EloRanking::new(client, "openai:judge".parse().unwrap(), standard)
    }

    fn responses() -> Vec<EnsembleResponse> {
        vec![
            EnsembleResponse::new("a:x", "alpha"),
            EnsembleResponse::new("a:y", "GOOD"),
            EnsembleResponse::new("a:z", "gamma"),
        ]
    }

    #[test]
    fn test_update_ratings() {
        let mut ratings = vec![1500.0, 1500.0];
        update_ratings(&mut ratings, 0, 1, 1.0);
        assert_eq!(ratings, vec![1516.0, 1484.0]);
        update_ratings(&mut ratings, 0, 1, 0.5);
        assert!(ratings[0] < 1516.0 && ratings[1] > 1484.0);
        assert!((ratings[0] + ratings[1] - 3000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_insufficient_responses_sentinel() {
        let gateway = gateway();
        let elo = elo(Arc::clone(&gateway));
        let out = elo.generate_consensus(&responses()[..2], 3, "Q?").await;
        assert_eq!(out.text, ELO_INSUFFICIENT_RESPONSES);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ranking_order_and_values() {
        let gateway = gateway();
        let elo = elo(Arc::clone(&gateway));
        let (ranked, _) = elo.rank_responses(&responses(), "Q?").await;

        let keys: Vec<&str> = ranked.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a:y", "a:x", "a:z"]);
        assert!((ranked[0].score - 1531.229).abs() < 0.01);
        assert!((ranked[1].score - 1484.737).abs() < 0.01);
        let total: f64 = ranked.iter().map(|r| r.score).sum();
        assert!((total - 4500.0).abs() < 1e-9);
        assert_eq!(gateway.calls_to("openai:judge"), 3);
    }

    #[tokio::test]
    async fn test_top_n_subset_goes_to_synthesis() {
        let gateway = gateway();
        let elo = elo(Arc::clone(&gateway));
        let out = elo.generate_consensus(&responses(), 2, "Q?").await;
        assert_eq!(out.text, "synth");

        let calls = gateway.calls.lock().unwrap();
        let synthesis = calls
            .iter()
            .find(|(m, _)| m == "openai:summarizer")
            .map(|(_, p)| p.clone())
            .unwrap();
        assert!(synthesis.contains("GOOD"));
        assert!(synthesis.contains("alpha"));
        assert!(!synthesis.contains("gamma"));
    }

    #[tokio::test]
    async fn test_failed_judge_calls_are_ties() {
        let gateway = Arc::new(ScriptedGateway::new(|model, _| {
            if model.model() == "judge" {
                Err(GatewayError::RequestFailed("judge down".to_string()))
            } else {
                Ok("synth".to_string())
            }
        }));
        let elo = elo(gateway);
        let (ranked, _) = elo.rank_responses(&responses(), "Q?").await;
        assert!(ranked.iter().all(|r| r.score == INITIAL_RATING));
        let keys: Vec<&str> = ranked.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a:x", "a:y", "a:z"]);
    }
}
