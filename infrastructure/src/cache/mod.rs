//! Response cache adapters
//!
//! | Cache | Mode | Use |
//! |-------|------|-----|
//! | [`FileResponseCache::ensemble`] | read-write, additive | replay members across runs |
//! | [`FileResponseCache::baseline`] | read-only | replay single-model baseline runs |
//! | [`TieredResponseCache`] | composite | consult several caches in order |

mod file_cache;
mod tiered;

pub use file_cache::{CacheMode, FileResponseCache, cache_file_name};
pub use tiered::TieredResponseCache;
