//! Content-addressed JSON response cache
//!
//! One file per `(member key, dataset, params)`, named by the blake3 hash of
//! the three parts. Entries inside a file are keyed by question id.

use quorum_application::{CacheError, ResponseCache};
use quorum_domain::RawResponse;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    member_key: String,
    dataset: String,
    params: String,
    entries: BTreeMap<String, RawResponse>,
}

struct MemberEntries {
    stored: BTreeMap<String, RawResponse>,
    pending: BTreeMap<String, RawResponse>,
}

/// File name for one cache partition.
///
/// Parts are length-prefixed before hashing so `("a_b", "c")` and
/// `("a", "b_c")` never collide.
pub fn cache_file_name(member_key: &str, dataset: &str, params: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [member_key, dataset, params] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{}.json", hasher.finalize().to_hex())
}

pub struct FileResponseCache {
    dir: PathBuf,
    dataset: String,
    params: String,
    mode: CacheMode,
    members: Mutex<HashMap<String, MemberEntries>>,
}

impl FileResponseCache {
    pub fn new(dir: impl Into<PathBuf>, dataset: &str, params: &str, mode: CacheMode) -> Self {
        Self {
            dir: dir.into(),
            dataset: dataset.to_string(),
            params: params.to_string(),
            mode,
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Read-write cache that merges new entries into existing files.
    pub fn ensemble(dir: impl Into<PathBuf>, dataset: &str, params: &str) -> Self {
        Self::new(dir, dataset, params, CacheMode::ReadWrite)
    }

    /// Read-only replay cache.
    pub fn baseline(dir: impl Into<PathBuf>, dataset: &str, params: &str) -> Self {
        Self::new(dir, dataset, params, CacheMode::ReadOnly)
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    fn path_for(&self, member_key: &str) -> PathBuf {
        self.dir
            .join(cache_file_name(member_key, &self.dataset, &self.params))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MemberEntries>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entries on disk; unreadable files count as empty.
    fn read_file(path: &Path) -> BTreeMap<String, RawResponse> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) => file.entries,
            Err(e) => {
                warn!(path = %path.display(), "Ignoring unreadable cache file: {}", e);
                BTreeMap::new()
            }
        }
    }

    /// The member's in-memory entries, loaded from disk on first touch.
    fn member<'a>(
        &self,
        members: &'a mut HashMap<String, MemberEntries>,
        member_key: &str,
    ) -> &'a mut MemberEntries {
        members
            .entry(member_key.to_string())
            .or_insert_with(|| MemberEntries {
                stored: Self::read_file(&self.path_for(member_key)),
                pending: BTreeMap::new(),
            })
    }

    fn write_file(&self, path: &Path, file: &CacheFile) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(file)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }
}

impl ResponseCache for FileResponseCache {
    fn get(&self, member_key: &str, question_id: &str) -> Option<RawResponse> {
        let mut members = self.lock();
        let entries = self.member(&mut members, member_key);
        entries
            .stored
            .get(question_id)
            .or_else(|| entries.pending.get(question_id))
            .cloned()
    }

    fn put(&self, member_key: &str, question_id: &str, response: &RawResponse) {
        if self.mode == CacheMode::ReadOnly || !response.is_success() {
            return;
        }
        let mut members = self.lock();
        let entries = self.member(&mut members, member_key);
        if !entries.stored.contains_key(question_id) {
            entries
                .pending
                .entry(question_id.to_string())
                .or_insert_with(|| response.clone());
        }
    }

    /// Merge pending entries into each member's file. Entries already on
    /// disk are kept as they are.
    fn flush(&self) -> Result<(), CacheError> {
        if self.mode == CacheMode::ReadOnly {
            return Ok(());
        }
        let mut members = self.lock();
        for (member_key, entries) in members.iter_mut() {
            if entries.pending.is_empty() {
                continue;
            }
            let path = self.path_for(member_key);
            let mut on_disk = Self::read_file(&path);
            let added = entries.pending.len();
            for (qid, response) in std::mem::take(&mut entries.pending) {
                on_disk.entry(qid).or_insert(response);
            }
            let file = CacheFile {
                member_key: member_key.clone(),
                dataset: self.dataset.clone(),
                params: self.params.clone(),
                entries: on_disk,
            };
            self.write_file(&path, &file)?;
            debug!(member = %member_key, added, total = file.entries.len(), "Cache flushed");
            entries.stored = file.entries;
        }
        Ok(())
    }
}
