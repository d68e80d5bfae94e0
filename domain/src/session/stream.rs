//! Streaming events for model communication.
//!
//! [`StreamEvent`] is the domain-side shape of the streaming capability
//! contract: `Delta` carries a chunk, `Completed` and `Error` terminate the
//! stream, and `Usage` optionally reports accounting before termination.

use serde::{Deserialize, Serialize};

/// Token and cost accounting for one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: Option<u64>,
    pub cost_usd: Option<f64>,
}

impl TokenUsage {
    pub fn new(total_tokens: Option<u64>, cost_usd: Option<f64>) -> Self {
        Self {
            total_tokens,
            cost_usd,
        }
    }

    /// Add another usage record, keeping `None` only when both sides are `None`.
    pub fn merge(self, other: TokenUsage) -> TokenUsage {
        fn add<T: std::ops::Add<Output = T>>(a: Option<T>, b: Option<T>) -> Option<T> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a + b),
                (a, None) => a,
                (None, b) => b,
            }
        }
        TokenUsage {
            total_tokens: add(self.total_tokens, other.total_tokens),
            cost_usd: add(self.cost_usd, other.cost_usd),
        }
    }
}

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// Token/cost accounting, sent at most once before the terminal event.
    Usage(TokenUsage),
    /// The complete response text (signals stream end).
    Completed(String),
    /// An error that occurred during streaming (signals stream end).
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_text_returns_content() {
        let event = StreamEvent::Delta("hello".to_string());
        assert_eq!(event.text(), Some("hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn completed_text_returns_content_and_is_terminal() {
        let event = StreamEvent::Completed("full response".to_string());
        assert_eq!(event.text(), Some("full response"));
        assert!(event.is_terminal());
    }

    #[test]
    fn error_text_returns_none_and_is_terminal() {
        let event = StreamEvent::Error("oops".to_string());
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }

    #[test]
    fn usage_is_not_terminal() {
        let event = StreamEvent::Usage(TokenUsage::new(Some(12), None));
        assert!(!event.is_terminal());
        assert_eq!(event.text(), None);
    }

    #[test]
    fn usage_merge_keeps_known_values() {
        let a = TokenUsage::new(Some(10), None);
        let b = TokenUsage::new(Some(5), Some(0.25));
        let merged = a.merge(b);
        assert_eq!(merged.total_tokens, Some(15));
        assert_eq!(merged.cost_usd, Some(0.25));
        assert_eq!(TokenUsage::default().merge(TokenUsage::default()), TokenUsage::default());
    }
}
