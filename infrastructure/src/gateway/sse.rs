//! Server-sent event parsing for streamed chat completions

use quorum_domain::TokenUsage;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUsage {
    #[serde(default)]
    total_tokens: Option<u64>,
    /// Reported by OpenRouter
    #[serde(default)]
    cost: Option<f64>,
}

impl ApiUsage {
    pub(crate) fn to_usage(&self) -> TokenUsage {
        TokenUsage::new(self.total_tokens, self.cost)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl StreamChunk {
    pub(crate) fn text(&self) -> String {
        self.choices
            .iter()
            .filter_map(|c| c.delta.as_ref().and_then(|d| d.content.as_deref()))
            .collect()
    }

    pub(crate) fn usage(&self) -> Option<TokenUsage> {
        self.usage.as_ref().map(ApiUsage::to_usage)
    }

    pub(crate) fn error_message(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| e.message.clone().unwrap_or_else(|| "stream error".to_string()))
    }
}

#[derive(Debug)]
pub(crate) enum SseEvent {
    Chunk(StreamChunk),
    Done,
}

/// Parse one SSE line. Comments, blank lines, non-data fields and
/// undecodable payloads yield `None`.
pub(crate) fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    serde_json::from_str(data).ok().map(SseEvent::Chunk)
}

/// Accumulates raw bytes and yields complete lines.
#[derive(Default)]
pub(crate) struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub(crate) fn next_line(&mut self) -> Option<String> {
        let pos = self.bytes.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).trim_end().to_string())
    }

    /// Whatever remains once the body ends
    pub(crate) fn rest(&mut self) -> Option<String> {
        if self.bytes.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.bytes).trim().to_string();
        self.bytes.clear();
        Some(line)
    }
}
