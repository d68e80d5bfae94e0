//! Prompt domain
//!
//! Templates for the summarizer and judge calls made by the consensus and
//! evaluation engines.

mod template;

pub use template::PromptTemplate;
