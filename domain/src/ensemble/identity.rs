//! Stable occurrence counter for duplicate ensemble identities.
//!
//! The first occurrence of a base identity keeps it unchanged; later
//! occurrences are suffixed `#2`, `#3`, … in input order.

use crate::core::model::ModelSpec;
use std::collections::{HashMap, HashSet};

/// Assigns disambiguated keys to identities in the order they are seen.
#[derive(Debug, Default, Clone)]
pub struct OccurrenceCounter {
    seen: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl OccurrenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the key for the next occurrence of `base`.
    ///
    /// A candidate that was already issued (a literal `id#2` in the input,
    /// say) is skipped, so every returned key is unique.
    pub fn next_key(&mut self, base: &str) -> String {
        let count = self.seen.entry(base.to_string()).or_insert(0);
        loop {
            *count += 1;
            let candidate = if *count == 1 {
                base.to_string()
            } else {
                format!("{}#{}", base, count)
            };
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Disambiguate a sequence of base identities, preserving order.
    pub fn assign<I, S>(bases: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counter = Self::new();
        bases
            .into_iter()
            .map(|b| counter.next_key(b.as_ref()))
            .collect()
    }
}

/// Keys for every ensemble member, in ensemble order.
pub fn member_keys(models: &[ModelSpec]) -> Vec<String> {
    OccurrenceCounter::assign(models.iter().map(ModelSpec::identity))
}
