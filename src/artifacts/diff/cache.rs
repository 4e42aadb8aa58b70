//! Memoized commit diffs
//!
//! Entries are immutable once inserted and never checked for freshness;
//! the owning session clears them when history changes.

use crate::artifacts::diff::delta::{Diff, DiffKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
pub struct DiffCache {
    entries: HashMap<DiffKey, Arc<Diff>>,
}

impl DiffCache {
    pub fn get(&self, key: &DiffKey) -> Option<Arc<Diff>> {
        self.entries.get(key).cloned()
    }

    /// Insert unless present; returns the entry that ends up cached
    pub fn insert(&mut self, key: DiffKey, diff: Diff) -> Arc<Diff> {
        self.entries
            .entry(key)
            .or_insert_with(|| Arc::new(diff))
            .clone()
    }

    /// Insert an already cached diff under another key, sharing its allocation
    pub fn insert_shared(&mut self, key: DiffKey, diff: Arc<Diff>) -> Arc<Diff> {
        self.entries.entry(key).or_insert(diff).clone()
    }

    pub fn invalidate(&mut self) {
        trace!(entries = self.entries.len(), "invalidating diff cache");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
