//! File-backed storage adapters
//!
//! - [`JsonRunStore`]: the benchmark accumulator, rewritten atomically after
//!   every question
//! - [`BaselineStore`]: write-once golden baselines
//! - [`load_dataset`]: JSON / JSONL question sets

mod atomic;
mod baseline;
mod dataset;
mod run_store;

pub use atomic::write_json_atomic;
pub use baseline::BaselineStore;
pub use dataset::{Dataset, DatasetError, load_dataset};
pub use run_store::{JsonRunStore, load_outputs};
