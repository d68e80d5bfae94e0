//! OpenAI-compatible chat completions gateway

use super::sse::{ApiErrorBody, LineBuffer, SseEvent, parse_sse_line};
use async_trait::async_trait;
use quorum_application::{GatewayError, LlmGateway, PromptRequest, StreamHandle};
use quorum_domain::core::model::UNKNOWN_PROVIDER;
use quorum_domain::{ModelSpec, StreamEvent, TokenUsage};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// Connection settings for [`OpenAiCompatibleGateway`]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

/// Gateway for any server exposing `/chat/completions` with SSE streaming.
///
/// Model specs map to wire ids as `provider/model`, the OpenRouter
/// convention; specs without a provider send the bare model id.
pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: String,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    stream: bool,
    stream_options: StreamOptions,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiErrorBody>,
}

impl OpenAiCompatibleGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to create HTTP client: {}", e)))?;
        info!(base_url = %config.base_url, "OpenAI-compatible gateway initialized");
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder, api_key: Option<&str>) -> reqwest::RequestBuilder {
        match api_key.or(self.config.api_key.as_deref()) {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.request_timeout)
        } else if e.is_connect() {
            GatewayError::ConnectionError(e.to_string())
        } else {
            GatewayError::RequestFailed(e.to_string())
        }
    }
}

/// Wire id for a model spec
pub(crate) fn wire_model_id(model: &ModelSpec) -> String {
    if model.provider() == UNKNOWN_PROVIDER {
        model.model().to_string()
    } else {
        format!("{}/{}", model.provider(), model.model())
    }
}

/// Inverse of [`wire_model_id`]
pub(crate) fn spec_from_wire_id(id: &str) -> ModelSpec {
    match id.split_once('/') {
        Some((provider, model)) => ModelSpec::new(provider, model),
        None => ModelSpec::new(UNKNOWN_PROVIDER, id),
    }
}

/// Classify a non-success response.
pub(crate) fn status_error(status: u16, body: &str, model: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| quorum_domain::core::string::truncate(body.trim(), MAX_ERROR_BODY));
    match status {
        401 | 403 => GatewayError::InvalidApiKey(model.to_string()),
        404 => GatewayError::ModelNotAvailable(format!("{}: {}", model, message)),
        _ => GatewayError::Http { status, message },
    }
}

/// Read the SSE body and forward it as stream events.
async fn pump(mut response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut buffer = LineBuffer::default();
    let mut text = String::new();
    let mut usage = TokenUsage::default();

    let handle = |line: &str, text: &mut String, usage: &mut TokenUsage| -> Result<bool, String> {
        match parse_sse_line(line) {
            Some(SseEvent::Done) => Ok(true),
            Some(SseEvent::Chunk(chunk)) => {
                if let Some(message) = chunk.error_message() {
                    return Err(message);
                }
                text.push_str(&chunk.text());
                if let Some(u) = chunk.usage() {
                    *usage = u;
                }
                Ok(false)
            }
            None => Ok(false),
        }
    };

    'read: loop {
        match response.chunk().await {
            Ok(Some(bytes)) => {
                buffer.push(&bytes);
                while let Some(line) = buffer.next_line() {
                    match handle(&line, &mut text, &mut usage) {
                        Ok(true) => break 'read,
                        Ok(false) => {}
                        Err(message) => {
                            let _ = tx.send(StreamEvent::Error(message)).await;
                            return;
                        }
                    }
                }
            }
            Ok(None) => {
                if let Some(line) = buffer.rest() {
                    if let Err(message) = handle(&line, &mut text, &mut usage) {
                        let _ = tx.send(StreamEvent::Error(message)).await;
                        return;
                    }
                }
                break;
            }
            Err(e) => {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        }
    }

    let _ = tx.send(StreamEvent::Usage(usage)).await;
    let _ = tx.send(StreamEvent::Completed(text)).await;
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn stream_response(
        &self,
        model: &ModelSpec,
        request: &PromptRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let model_id = wire_model_id(model);
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ApiMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ApiMessage {
            role: "user",
            content: &request.prompt,
        });
        let body = ChatApiRequest {
            model: model_id.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            stream: true,
            stream_options: StreamOptions { include_usage: true },
        };

        debug!(model = %model_id, "Sending chat completion");
        let response = self
            .authorized(self.client.post(self.url("chat/completions")), None)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &text, &model_id));
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(pump(response, tx));
        Ok(StreamHandle::new(rx))
    }

    async fn available_models(&self) -> Result<Vec<ModelSpec>, GatewayError> {
        let response = self
            .authorized(self.client.get(self.url("models")), None)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text, "models"));
        }
        let parsed: ModelsResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::RequestFailed(format!("Invalid models response: {}", e)))?;
        let mut models: Vec<ModelSpec> = parsed.data.iter().map(|m| spec_from_wire_id(&m.id)).collect();
        models.sort();
        Ok(models)
    }

    async fn validate_api_key(&self, provider: &str, api_key: &str) -> Result<bool, GatewayError> {
        let response = self
            .authorized(self.client.get(self.url("models")), Some(api_key))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(provider, "API key rejected");
                Ok(false)
            }
            s => {
                let text = response.text().await.unwrap_or_default();
                Err(status_error(s.as_u16(), &text, provider))
            }
        }
    }
}
