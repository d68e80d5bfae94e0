//! Temp-file + rename writes

use quorum_application::StoreError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Serialize `value` as pretty JSON next to `path`, then rename over it.
///
/// Readers see either the previous file or the new one, never a partial
/// write.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(io_err)?;
            parent.to_path_buf()
        }
        None => std::path::PathBuf::from("."),
    };

    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_json_atomic(&path, &vec![1, 2]).unwrap();
        write_json_atomic(&path, &vec![3]).unwrap();
        let back: Vec<i32> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![3]);
        // Only the target remains in the directory
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
