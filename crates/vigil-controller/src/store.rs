//! In-memory resource store

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use vigil_types::{ResourceKey, StatusResource};

use crate::error::FetchError;
use crate::fetch::ResourceFetcher;

/// In-memory resource store for embedding and testing.
///
/// Fetches return clones, so the observer never shares state with stored
/// objects. Errors queued with [`fail_next`](Self::fail_next) are returned
/// by the following fetches, oldest first.
#[derive(Debug)]
pub struct MemoryStore<R> {
    objects: DashMap<ResourceKey, R>,
    failures: Mutex<VecDeque<FetchError>>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            objects: DashMap::new(),
            failures: Mutex::new(VecDeque::new()),
        }
    }
}

impl<R: StatusResource + Clone> MemoryStore<R> {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a resource, returning the previous one
    pub fn upsert(&self, resource: R) -> Option<R> {
        self.objects.insert(resource.key(), resource)
    }

    pub fn get(&self, key: &ResourceKey) -> Option<R> {
        self.objects.get(key).map(|r| r.value().clone())
    }

    /// Mutate a stored resource in place. Returns false if it does not exist.
    pub fn update<F>(&self, key: &ResourceKey, f: F) -> bool
    where
        F: FnOnce(&mut R),
    {
        match self.objects.get_mut(key) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, key: &ResourceKey) -> Option<R> {
        self.objects.remove(key).map(|(_, r)| r)
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Make the next fetch fail with `err`
    pub fn fail_next(&self, err: FetchError) {
        self.failures.lock().push_back(err);
    }
}

#[async_trait]
impl<R: StatusResource + Clone + 'static> ResourceFetcher<R> for MemoryStore<R> {
    async fn fetch(&self, key: &ResourceKey) -> Result<Option<R>, FetchError> {
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.get(key))
    }
}
