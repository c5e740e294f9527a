//! Client-side view of what the backend has ingested.

use crate::api::types::DocumentItem;
use std::collections::BTreeMap;

/// Ingested document keys and their chunk counts, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentIndex {
    entries: BTreeMap<String, u64>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add chunks for `key`, creating the entry if needed.
    pub fn record_ingest(&mut self, key: impl Into<String>, count: u64) {
        *self.entries.entry(key.into()).or_insert(0) += count;
    }

    /// Remove the given keys; returns how many were present.
    pub fn remove<I, K>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter(|key| self.entries.remove(key.as_ref()).is_some())
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the whole index with a server listing.
    pub fn replace(&mut self, items: &[DocumentItem]) {
        self.entries = items
            .iter()
            .map(|item| (item.key.clone(), item.count))
            .collect();
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_chunks(&self) -> u64 {
        self.entries.values().sum()
    }
}
