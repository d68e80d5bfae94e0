//! Cache chain

use quorum_application::{CacheError, ResponseCache};
use quorum_domain::RawResponse;
use std::sync::Arc;

/// Consults caches in order; inserts and flushes go to every layer (read-only
/// layers ignore them).
pub struct TieredResponseCache {
    layers: Vec<Arc<dyn ResponseCache>>,
}

impl TieredResponseCache {
    pub fn new(layers: Vec<Arc<dyn ResponseCache>>) -> Self {
        Self { layers }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ResponseCache for TieredResponseCache {
    fn get(&self, member_key: &str, question_id: &str) -> Option<RawResponse> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(member_key, question_id))
    }

    fn put(&self, member_key: &str, question_id: &str, response: &RawResponse) {
        for layer in &self.layers {
            layer.put(member_key, question_id, response);
        }
    }

    fn flush(&self) -> Result<(), CacheError> {
        self.layers.iter().try_for_each(|layer| layer.flush())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileResponseCache;

    #[test]
    fn test_first_hit_wins_and_writes_reach_writable_layers() {
        let baseline_dir = tempfile::tempdir().unwrap();
        let ensemble_dir = tempfile::tempdir().unwrap();
        let spec = "openai:gpt-4.1".parse().unwrap();

        let seed = FileResponseCache::ensemble(baseline_dir.path(), "gsm8k", "p");
        seed.put("m", "q1", &RawResponse::success("m", &spec, "from-baseline", 1));
        seed.flush().unwrap();

        let tiered = TieredResponseCache::new(vec![
            Arc::new(FileResponseCache::baseline(baseline_dir.path(), "gsm8k", "p")),
            Arc::new(FileResponseCache::ensemble(ensemble_dir.path(), "gsm8k", "p")),
        ]);
        assert_eq!(tiered.get("m", "q1").unwrap().content, "from-baseline");

        tiered.put("m", "q2", &RawResponse::success("m", &spec, "fresh", 1));
        tiered.flush().unwrap();

        let ensemble = FileResponseCache::ensemble(ensemble_dir.path(), "gsm8k", "p");
        assert_eq!(ensemble.get("m", "q2").unwrap().content, "fresh");
        let baseline = FileResponseCache::baseline(baseline_dir.path(), "gsm8k", "p");
        assert!(baseline.get("m", "q2").is_none());
    }
}
