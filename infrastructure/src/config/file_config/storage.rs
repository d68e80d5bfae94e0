//! Cache and provider configuration (`[cache]`, `[provider]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ```toml
/// [cache]
/// ensemble_dir = ".quorum-bench/cache"
/// baseline_dir = "baselines/cache"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    /// Read-write cache of member responses; unset disables caching
    pub ensemble_dir: Option<PathBuf>,
    /// Read-only cache replayed from a baseline run
    pub baseline_dir: Option<PathBuf>,
}

/// OpenAI-compatible chat completions endpoint
///
/// ```toml
/// [provider]
/// base_url = "https://openrouter.ai/api/v1"
/// api_key_env = "OPENROUTER_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Direct API key (prefer the environment variable)
    pub api_key: Option<String>,
    pub max_tokens: u32,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_key: None,
            max_tokens: 4096,
            request_timeout_secs: 120,
        }
    }
}

impl FileProviderConfig {
    /// The configured key, else the value of `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
