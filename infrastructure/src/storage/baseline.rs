//! Golden baseline files

use super::atomic::write_json_atomic;
use quorum_application::StoreError;
use quorum_domain::GoldenBaseline;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads and writes `GoldenBaseline` JSON files.
///
/// Baselines are write-once: [`create`](Self::create) refuses to replace an
/// existing file unless forced.
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn create(&self, baseline: &GoldenBaseline, force: bool) -> Result<(), StoreError> {
        if self.path.exists() && !force {
            return Err(StoreError::AlreadyExists(self.path.clone()));
        }
        write_json_atomic(&self.path, baseline)?;
        info!(
            tier = %baseline.tier,
            questions = baseline.question_ids.len(),
            path = %self.path.display(),
            "Baseline written"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<GoldenBaseline, StoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Serialization {
            path: self.path.clone(),
            source,
        })
    }
}
