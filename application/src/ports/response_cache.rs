//! Response cache port
//!
//! Replays member responses recorded by earlier runs so a question can be
//! recomputed without provider calls. Entries are keyed by the disambiguated
//! member key and the question id.

use quorum_domain::RawResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait ResponseCache: Send + Sync {
    /// A cached successful response for this member and question
    fn get(&self, member_key: &str, question_id: &str) -> Option<RawResponse>;

    /// Record a successful response. Read-only caches ignore inserts.
    fn put(&self, member_key: &str, question_id: &str, response: &RawResponse);

    /// Persist pending inserts
    fn flush(&self) -> Result<(), CacheError>;
}

/// Cache that never hits
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _member_key: &str, _question_id: &str) -> Option<RawResponse> {
        None
    }

    fn put(&self, _member_key: &str, _question_id: &str, _response: &RawResponse) {}

    fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
