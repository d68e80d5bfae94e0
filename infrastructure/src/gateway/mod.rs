//! Provider gateways
//!
//! [`OpenAiCompatibleGateway`] speaks the `/chat/completions` and `/models`
//! endpoints shared by OpenAI, OpenRouter and most local servers.

mod openai;
mod sse;

pub use openai::{GatewayConfig, OpenAiCompatibleGateway};
