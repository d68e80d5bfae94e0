//! Run store port
//!
//! Persists the benchmark output accumulator. Every `save` writes the whole
//! accumulator so each checkpoint on disk can be loaded on its own.

use quorum_domain::BenchmarkOutput;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

pub trait RunStore: Send + Sync {
    /// Load the accumulator, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<BenchmarkOutput>, StoreError>;

    /// Replace the stored accumulator with `output`
    fn save(&self, output: &BenchmarkOutput) -> Result<(), StoreError>;
}
