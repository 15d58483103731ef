//! Per-resource observation state
//!
//! The observer keeps one [`Snapshot`] per resource key: an owned copy of
//! what it last saw. Replacing a snapshot is atomic per key, so two
//! overlapping reconciles of the same key each diff against a complete
//! previous snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use vigil_types::{Condition, ResourceKey};

/// What the observer last saw of one resource
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub uid: String,

    /// Conditions, sorted by type
    pub conditions: Vec<Condition>,

    pub finalizers: Vec<String>,

    /// Deletion timestamp first seen, if the resource is terminating
    pub terminating_since: Option<DateTime<Utc>>,

    /// Resource labels, kept for metrics written after the resource is gone
    pub labels: BTreeMap<String, String>,

    pub observed_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    pub fn is_terminating(&self) -> bool {
        self.terminating_since.is_some()
    }
}

/// Concurrent map from resource key to snapshot
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: DashMap<ResourceKey, Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for `key` with one built from the previous
    /// snapshot, returning the previous snapshot. The entry stays locked
    /// while `next` runs.
    pub fn swap<F>(&self, key: ResourceKey, next: F) -> Option<Snapshot>
    where
        F: FnOnce(Option<&Snapshot>) -> Snapshot,
    {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                let snapshot = next(Some(entry.get()));
                Some(entry.insert(snapshot))
            }
            Entry::Vacant(entry) => {
                entry.insert(next(None));
                None
            }
        }
    }

    pub fn remove(&self, key: &ResourceKey) -> Option<Snapshot> {
        self.entries.remove(key).map(|(_, snapshot)| snapshot)
    }

    pub fn get(&self, key: &ResourceKey) -> Option<Snapshot> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Tracked keys, sorted
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
