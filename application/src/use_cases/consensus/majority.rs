//! Majority voting: judge alignment scores, then a majority-weighted synthesis

use super::{RankedResponse, shortfall};
use crate::client::ModelClient;
use crate::ports::llm_gateway::{GeneratedText, PromptRequest};
use quorum_domain::consensus::{NEUTRAL_ALIGNMENT, parse_alignment_scores};
use quorum_domain::{
    ConsensusStrategyKind, EnsembleResponse, ModelSpec, PromptTemplate, SYNTHESIS_FAILED,
    TokenUsage,
};
use std::sync::Arc;
use tracing::warn;

pub struct MajorityVoting {
    client: Arc<ModelClient>,
    judge: ModelSpec,
    summarizer: ModelSpec,
}

impl MajorityVoting {
    pub fn new(client: Arc<ModelClient>, judge: ModelSpec, summarizer: ModelSpec) -> Self {
        Self {
            client,
            judge,
            summarizer,
        }
    }

    pub async fn generate_consensus(&self, responses: &[EnsembleResponse], prompt: &str) -> GeneratedText {
        if let Some(sentinel) = shortfall(ConsensusStrategyKind::Majority, responses) {
            return sentinel;
        }

        let (scores, judge_usage) = self.alignment_scores(responses, prompt).await;

        let request = PromptRequest::new(PromptTemplate::majority_synthesis_prompt(
            prompt, responses, &scores,
        ))
        .with_system(PromptTemplate::synthesis_system());
        match self.client.generate(&self.summarizer, &request).await {
            Ok(mut generated) => {
                generated.usage = judge_usage.merge(generated.usage);
                generated
            }
            Err(e) => {
                warn!(summarizer = %self.summarizer, "Majority synthesis failed: {}", e);
                GeneratedText {
                    text: SYNTHESIS_FAILED.to_string(),
                    usage: judge_usage,
                }
            }
        }
    }

    /// Responses ordered by alignment score, highest first.
    pub async fn rank_responses(
        &self,
        responses: &[EnsembleResponse],
        prompt: &str,
    ) -> (Vec<RankedResponse>, TokenUsage) {
        let (scores, usage) = self.alignment_scores(responses, prompt).await;
        let mut ranked: Vec<RankedResponse> = responses
            .iter()
            .zip(scores)
            .map(|(r, score)| RankedResponse {
                key: r.key.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        (ranked, usage)
    }

    /// One score per response; a failed judge call yields neutral scores.
    async fn alignment_scores(
        &self,
        responses: &[EnsembleResponse],
        prompt: &str,
    ) -> (Vec<f64>, TokenUsage) {
        let request = PromptRequest::new(PromptTemplate::alignment_prompt(prompt, responses))
            .with_system(PromptTemplate::alignment_system());
        match self.client.generate(&self.judge, &request).await {
            Ok(generated) => (
                parse_alignment_scores(&generated.text, responses.len()),
                generated.usage,
            ),
            Err(e) => {
                warn!(judge = %self.judge, "Alignment scoring failed, using neutral scores: {}", e);
                (vec![NEUTRAL_ALIGNMENT; responses.len()], TokenUsage::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ScriptedGateway, client};
    use crate::ports::llm_gateway::GatewayError;
    use quorum_domain::MAJORITY_INSUFFICIENT_RESPONSES;

    fn majority(gateway: Arc<ScriptedGateway>) -> MajorityVoting {
        MajorityVoting::new(
            client(gateway),
            "openai:judge".parse().unwrap(),
            "openai:summarizer".parse().unwrap(),
        )
    }

    fn responses() -> Vec<EnsembleResponse> {
        vec![
            EnsembleResponse::new("a:x", "Paris"),
            EnsembleResponse::new("a:x#2", "Paris, France"),
            EnsembleResponse::new("a:y", "Lyon"),
        ]
    }

    #[tokio::test]
    async fn test_insufficient_responses_sentinel() {
        let gateway = Arc::new(ScriptedGateway::constant("unused"));
        let out = majority(Arc::clone(&gateway))
            .generate_consensus(&responses()[..1], "Q?")
            .await;
        assert_eq!(out.text, MAJORITY_INSUFFICIENT_RESPONSES);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scores_feed_majority_prompt() {
        let gateway = Arc::new(ScriptedGateway::new(|model, _| {
            Ok(match model.model() {
                "judge" => r#"{"scores": [9, 8, 1]}"#.to_string(),
                _ => "Paris".to_string(),
            })
        }));
        let out = majority(Arc::clone(&gateway))
            .generate_consensus(&responses(), "Capital of France?")
            .await;
        assert_eq!(out.text, "Paris");
        assert_eq!(out.usage.total_tokens, Some(20));

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains("Response 3 (agreement 1.0)"));
    }

    #[tokio::test]
    async fn test_rank_by_alignment() {
        let gateway = Arc::new(ScriptedGateway::constant("Response 1: 3\nResponse 2: 9\nResponse 3: 9"));
        let (ranked, _) = majority(gateway).rank_responses(&responses(), "Q?").await;
        let keys: Vec<&str> = ranked.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a:x#2", "a:y", "a:x"]);
    }

    #[tokio::test]
    async fn test_judge_failure_uses_neutral_scores() {
        let gateway = Arc::new(ScriptedGateway::new(|model, _| {
            if model.model() == "judge" {
                Err(GatewayError::RequestFailed("judge down".to_string()))
            } else {
                Ok("merged".to_string())
            }
        }));
        let m = majority(Arc::clone(&gateway));
        let out = m.generate_consensus(&responses(), "Q?").await;
        assert_eq!(out.text, "merged");
        let calls = gateway.calls.lock().unwrap();
        assert!(calls[1].1.contains("Response 1 (agreement 5.0)"));
    }
}
