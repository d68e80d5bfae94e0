//! LLM streaming session domain.
//!
//! - [`stream::StreamEvent`]: one event in a streamed model response
//! - [`stream::TokenUsage`]: token and cost accounting reported at stream end

pub mod stream;
