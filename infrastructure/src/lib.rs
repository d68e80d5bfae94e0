//! Infrastructure layer for quorum-bench
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: file storage, response caches, the provider gateway,
//! the JSONL progress log, and configuration file loading.

pub mod cache;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use cache::{CacheMode, FileResponseCache, TieredResponseCache};
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use gateway::{GatewayConfig, OpenAiCompatibleGateway};
pub use logging::JsonlProgressLogger;
pub use storage::{
    BaselineStore, Dataset, DatasetError, JsonRunStore, load_dataset, load_outputs,
};
