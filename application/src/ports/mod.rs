//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod llm_gateway;
pub mod progress;
pub mod response_cache;
pub mod run_store;
