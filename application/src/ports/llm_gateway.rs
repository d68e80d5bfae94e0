//! LLM Gateway port
//!
//! Defines the streaming text-generation capability the benchmark depends on.
//! Vendor wire protocols live behind this trait in the infrastructure layer.

use async_trait::async_trait;
use quorum_domain::{ModelSpec, StreamEvent, TokenUsage};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::concurrency::RateLimitAware;

static RETRYABLE_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)rate.?limit|too many requests|overloaded|quota exceeded|internal server error|server error|service unavailable|bad gateway|gateway time-?out|timed? ?out|temporarily unavailable|ECONNRESET|connection reset|\b(?:429|5\d\d)\b",
    )
    .expect("valid retryable pattern")
});

static RATE_LIMIT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rate.?limit|too many requests|quota exceeded|\b429\b")
        .expect("valid rate limit pattern")
});

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid API key for provider {0}")]
    InvalidApiKey(String),

    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error(
        "Deadline of {}ms exceeded after {attempts} attempt(s); last error: {}",
        .timeout.as_millis(),
        .last_error.as_deref().unwrap_or("none")
    )]
    DeadlineExceeded {
        timeout: Duration,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 429, 5xx, or a message that reads like a transient provider failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::InvalidApiKey(_)
            | GatewayError::ModelNotAvailable(_)
            | GatewayError::DeadlineExceeded { .. } => false,
            GatewayError::Timeout(_) => true,
            other => match other.status_code() {
                Some(429) | Some(500..=599) => true,
                Some(_) => false,
                None => RETRYABLE_MESSAGE.is_match(&other.to_string()),
            },
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        match self.status_code() {
            Some(status) => status == 429,
            None => {
                !matches!(self, GatewayError::DeadlineExceeded { .. })
                    && RATE_LIMIT_MESSAGE.is_match(&self.to_string())
            }
        }
    }
}

impl RateLimitAware for GatewayError {
    fn is_rate_limit(&self) -> bool {
        GatewayError::is_rate_limit(self)
    }
}

/// One generation request: an optional system prompt and the user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub system: Option<String>,
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Fully collected model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    pub usage: TokenUsage,
}

impl GeneratedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenUsage::default(),
        }
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Start a streamed completion for `request` on `model`
    async fn stream_response(
        &self,
        model: &ModelSpec,
        request: &PromptRequest,
    ) -> Result<StreamHandle, GatewayError>;

    /// List text models the provider currently serves
    async fn available_models(&self) -> Result<Vec<ModelSpec>, GatewayError>;

    /// Check an API key against the provider without running a completion
    async fn validate_api_key(&self, provider: &str, api_key: &str) -> Result<bool, GatewayError>;
}

/// Handle for receiving streaming events from a model call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Build a handle that yields one completed response.
    pub fn completed(text: impl Into<String>, usage: TokenUsage) -> Self {
        let (tx, rx) = mpsc::channel(2);
        // Capacity covers both events, so try_send cannot fail on a fresh channel
        let _ = tx.try_send(StreamEvent::Usage(usage));
        let _ = tx.try_send(StreamEvent::Completed(text.into()));
        Self::new(rx)
    }

    /// Consume the stream, collecting text and usage.
    pub async fn collect(mut self) -> Result<GeneratedText, GatewayError> {
        let mut full_text = String::new();
        let mut usage = TokenUsage::default();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Usage(u) => usage = usage.merge(u),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        full_text = text;
                    }
                    return Ok(GeneratedText {
                        text: full_text,
                        usage,
                    });
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::RequestFailed(e));
                }
            }
        }
        // Channel closed without Completed: return what we have
        Ok(GeneratedText {
            text: full_text,
            usage,
        })
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(self) -> Result<String, GatewayError> {
        self.collect().await.map(|g| g.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let rate = GatewayError::Http {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(rate.is_retryable());
        assert!(rate.is_rate_limit());

        let server = GatewayError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(server.is_retryable());
        assert!(!server.is_rate_limit());

        let bad_request = GatewayError::Http {
            status: 400,
            message: "rate limit of tokens per request".to_string(),
        };
        assert!(!bad_request.is_retryable());
        assert!(!bad_request.is_rate_limit());
    }

    #[test]
    fn test_message_classification() {
        assert!(GatewayError::RequestFailed("Rate limit exceeded".to_string()).is_rate_limit());
        assert!(GatewayError::Other("The model is overloaded".to_string()).is_retryable());
        assert!(GatewayError::ConnectionError("ECONNRESET".to_string()).is_retryable());
        assert!(GatewayError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!GatewayError::RequestFailed("invalid json".to_string()).is_retryable());
        assert!(!GatewayError::InvalidApiKey("openai".to_string()).is_retryable());
    }

    #[test]
    fn test_deadline_message_includes_last_error() {
        let err = GatewayError::DeadlineExceeded {
            timeout: Duration::from_millis(1500),
            attempts: 2,
            last_error: Some("HTTP 503: unavailable".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("1500ms"));
        assert!(message.contains("HTTP 503: unavailable"));
        assert!(!err.is_retryable());
        assert!(!err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_collect_deltas_and_usage() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("Hello, ".to_string())).await.unwrap();
        tx.send(StreamEvent::Delta("world".to_string())).await.unwrap();
        tx.send(StreamEvent::Usage(TokenUsage::new(Some(7), Some(0.001))))
            .await
            .unwrap();
        tx.send(StreamEvent::Completed("ignored".to_string())).await.unwrap();
        let out = StreamHandle::new(rx).collect().await.unwrap();
        assert_eq!(out.text, "Hello, world");
        assert_eq!(out.usage.total_tokens, Some(7));
    }

    #[tokio::test]
    async fn test_collect_error_event() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(StreamEvent::Error("HTTP 500".to_string())).await.unwrap();
        let err = StreamHandle::new(rx).collect_text().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let text = StreamHandle::completed("done", TokenUsage::default())
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, "done");
    }
}
