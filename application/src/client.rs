//! Model client: the gateway wrapped in retry and concurrency control
//!
//! Every provider call a run makes (ensemble members, summarizer, judge)
//! goes through one [`ModelClient`] so that they all share the same
//! [`AdaptiveConcurrencyController`].

use crate::concurrency::AdaptiveConcurrencyController;
use crate::ports::llm_gateway::{GatewayError, GeneratedText, LlmGateway, PromptRequest};
use crate::retry::{RetryHooks, RetryPolicy};
use quorum_domain::ModelSpec;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ModelClient {
    gateway: Arc<dyn LlmGateway>,
    controller: Arc<AdaptiveConcurrencyController>,
    retry: RetryPolicy,
}

impl ModelClient {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        controller: Arc<AdaptiveConcurrencyController>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            controller,
            retry,
        }
    }

    pub fn controller(&self) -> &Arc<AdaptiveConcurrencyController> {
        &self.controller
    }

    pub fn gateway(&self) -> &Arc<dyn LlmGateway> {
        &self.gateway
    }

    /// Generate a complete response from `model`.
    ///
    /// Each attempt takes its own controller slot, so backoff sleeps do not
    /// hold capacity.
    pub async fn generate(
        &self,
        model: &ModelSpec,
        request: &PromptRequest,
    ) -> Result<GeneratedText, GatewayError> {
        let controller = &self.controller;
        let hooks = RetryHooks::new()
            .on_rate_limit(|| {
                controller.notify_rate_limit();
            })
            .on_retry(|err, attempt| {
                warn!(model = %model, attempt, "Model call failed, retrying: {}", err);
            });

        let result = self
            .retry
            .run(
                || {
                    let gateway = Arc::clone(&self.gateway);
                    controller.run(move || async move {
                        gateway.stream_response(model, request).await?.collect().await
                    })
                },
                &hooks,
            )
            .await;

        if let Ok(generated) = &result {
            debug!(
                model = %model,
                chars = generated.text.len(),
                concurrency = controller.current_concurrency(),
                "Model call completed"
            );
        }
        result
    }

    /// Shortcut returning only the text.
    pub async fn generate_text(
        &self,
        model: &ModelSpec,
        request: &PromptRequest,
    ) -> Result<String, GatewayError> {
        self.generate(model, request).await.map(|g| g.text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory gateway shared by use case tests.

    use super::*;
    use crate::concurrency::ConcurrencyConfig;
    use crate::ports::llm_gateway::StreamHandle;
    use async_trait::async_trait;
    use quorum_domain::TokenUsage;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    type Responder = Box<dyn Fn(&ModelSpec, &PromptRequest) -> Result<String, GatewayError> + Send + Sync>;

    /// Gateway answering through a closure and recording every call.
    pub struct ScriptedGateway {
        responder: Responder,
        queued: Mutex<VecDeque<Result<String, GatewayError>>>,
        pub calls: Mutex<Vec<(String, String)>>,
        pub delay: Option<Duration>,
    }

    impl ScriptedGateway {
        pub fn new(
            responder: impl Fn(&ModelSpec, &PromptRequest) -> Result<String, GatewayError>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                queued: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        /// Answer every call with `text`.
        pub fn constant(text: &str) -> Self {
            let text = text.to_string();
            Self::new(move |_, _| Ok(text.clone()))
        }

        /// Queued results are returned before falling back to the responder.
        pub fn push(&self, result: Result<String, GatewayError>) {
            self.queued.lock().unwrap().push_back(result);
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_to(&self, model: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == model)
                .count()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn stream_response(
            &self,
            model: &ModelSpec,
            request: &PromptRequest,
        ) -> Result<StreamHandle, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), request.prompt.clone()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let queued = self.queued.lock().unwrap().pop_front();
            let text = match queued {
                Some(result) => result?,
                None => (self.responder)(model, request)?,
            };
            Ok(StreamHandle::completed(text, TokenUsage::new(Some(10), Some(0.001))))
        }

        async fn available_models(&self) -> Result<Vec<ModelSpec>, GatewayError> {
            Ok(vec![])
        }

        async fn validate_api_key(&self, _provider: &str, api_key: &str) -> Result<bool, GatewayError> {
            Ok(!api_key.is_empty())
        }
    }

    /// Client with no retries and a roomy controller.
    pub fn client(gateway: Arc<ScriptedGateway>) -> Arc<ModelClient> {
        client_with_retry(gateway, RetryPolicy::new(1, Duration::ZERO, Duration::ZERO))
    }

    pub fn client_with_retry(gateway: Arc<ScriptedGateway>, retry: RetryPolicy) -> Arc<ModelClient> {
        let controller = Arc::new(AdaptiveConcurrencyController::new(ConcurrencyConfig::new(
            8,
            1,
            8,
            Duration::from_secs(1),
        )));
        Arc::new(ModelClient::new(gateway, controller, retry))
    }
}
