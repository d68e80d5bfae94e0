//! JSON file [`RunStore`]

use super::atomic::write_json_atomic;
use quorum_application::{RunStore, StoreError};
use quorum_domain::BenchmarkOutput;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The accumulator as one pretty-printed JSON file.
pub struct JsonRunStore {
    path: PathBuf,
}

impl JsonRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunStore for JsonRunStore {
    fn load(&self) -> Result<Option<BenchmarkOutput>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        read_output(&self.path).map(Some)
    }

    fn save(&self, output: &BenchmarkOutput) -> Result<(), StoreError> {
        write_json_atomic(&self.path, output)?;
        debug!(path = %self.path.display(), runs = output.runs.len(), "Saved run file");
        Ok(())
    }
}

fn read_output(path: &Path) -> Result<BenchmarkOutput, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Read several run files, e.g. the current side of a regression comparison.
pub fn load_outputs(paths: &[PathBuf]) -> Result<Vec<BenchmarkOutput>, StoreError> {
    paths.iter().map(|p| read_output(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_domain::{ConsensusStrategyKind, EvaluatorKind};

    fn output() -> BenchmarkOutput {
        BenchmarkOutput::new(
            "gsm8k",
            EvaluatorKind::Numeric,
            vec!["openai:gpt-4.1".parse().unwrap()],
            vec![ConsensusStrategyKind::Standard],
        )
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRunStore::new(dir.path().join("run.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRunStore::new(dir.path().join("runs/gsm8k.json"));
        let output = output();
        store.save(&output).unwrap();
        assert_eq!(store.load().unwrap(), Some(output));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonRunStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[test]
    fn test_load_outputs_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_outputs(&[dir.path().join("missing.json")]).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
