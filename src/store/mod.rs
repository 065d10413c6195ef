// src/store/mod.rs
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::listing::Listing;

/// Durable set of listing identities. `try_claim` is the single serialization
/// point for at-most-once notification: exactly one caller per identity ever
/// sees `true`. Entries are append-only from the pipeline's perspective.
#[async_trait::async_trait]
pub trait ListingStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;
    /// Persist the listing if its identity is unseen. Returns true iff this
    /// call inserted it; a concurrent duplicate claim observes false, not an
    /// error.
    async fn try_claim(&self, listing: &Listing) -> Result<bool>;
}

/// Non-durable store for tests and dry runs. The map mutex makes check-and-
/// insert atomic, matching the contract of the SQLite unique index.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Listing>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ListingStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .contains_key(key))
    }

    async fn try_claim(&self, listing: &Listing) -> Result<bool> {
        let mut map = self.inner.lock().expect("store mutex poisoned");
        let key = listing.identity_key().to_string();
        if map.contains_key(&key) {
            return Ok(false);
        }
        let mut stored = listing.clone();
        let now = chrono::Utc::now();
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        map.insert(key, stored);
        Ok(true)
    }
}
