//! Standard synthesis: merge every response into one answer

use super::shortfall;
use crate::client::ModelClient;
use crate::ports::llm_gateway::{GeneratedText, PromptRequest};
use quorum_domain::{
    ConsensusStrategyKind, EnsembleResponse, ModelSpec, PromptTemplate, SYNTHESIS_FAILED,
};
use std::sync::Arc;
use tracing::warn;

pub struct StandardSynthesis {
    client: Arc<ModelClient>,
    summarizer: ModelSpec,
}

impl StandardSynthesis {
    pub fn new(client: Arc<ModelClient>, summarizer: ModelSpec) -> Self {
        Self { client, summarizer }
    }

    /// Summarizer output verbatim, or [`SYNTHESIS_FAILED`] on error or
    /// when no response succeeded.
    pub async fn synthesize(&self, responses: &[EnsembleResponse], prompt: &str) -> GeneratedText {
        if let Some(sentinel) = shortfall(ConsensusStrategyKind::Standard, responses) {
            return sentinel;
        }
        let request = PromptRequest::new(PromptTemplate::synthesis_prompt(prompt, responses))
            .with_system(PromptTemplate::synthesis_system());
        match self.client.generate(&self.summarizer, &request).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(summarizer = %self.summarizer, "Synthesis failed: {}", e);
                GeneratedText::new(SYNTHESIS_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ScriptedGateway, client};
    use crate::ports::llm_gateway::GatewayError;

    #[tokio::test]
    async fn test_returns_summarizer_output_verbatim() {
        let gateway = Arc::new(ScriptedGateway::constant("  B  "));
        let standard = StandardSynthesis::new(client(Arc::clone(&gateway)), "openai:s".parse().unwrap());
        let responses = vec![
            EnsembleResponse::new("a:x", "I think B"),
            EnsembleResponse::new("a:y", "C"),
        ];
        let out = standard.synthesize(&responses, "Pick one letter").await;
        assert_eq!(out.text, "  B  ");

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "openai:s");
        assert!(calls[0].1.contains("I think B"));
        assert!(calls[0].1.contains("Pick one letter"));
    }

    #[tokio::test]
    async fn test_failure_returns_fixed_string() {
        let gateway = Arc::new(ScriptedGateway::new(|_, _| {
            Err(GatewayError::RequestFailed("boom".to_string()))
        }));
        let standard = StandardSynthesis::new(client(gateway), "openai:s".parse().unwrap());
        let out = standard
            .synthesize(&[EnsembleResponse::new("a:x", "1")], "Q?")
            .await;
        assert_eq!(out.text, SYNTHESIS_FAILED);
    }

    #[tokio::test]
    async fn test_no_responses_skips_summarizer() {
        let gateway = Arc::new(ScriptedGateway::constant("Final answer: 42"));
        let standard = StandardSynthesis::new(client(Arc::clone(&gateway)), "openai:s".parse().unwrap());
        let out = standard.synthesize(&[], "What is 6*7?").await;
        assert_eq!(out.text, SYNTHESIS_FAILED);
        assert_eq!(gateway.call_count(), 0);
    }
}
