//! Service-description cache.
//!
//! Descriptions are large and change only with new API versions, so a client
//! can be given a [`DescriptionCache`] that is consulted before every fetch.
//! Only description documents are cached, keyed by their URL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;

/// Storage for fetched service descriptions.
///
/// Implementations are shared between every proxy created from one client
/// and must tolerate concurrent use.
pub trait DescriptionCache: Send + Sync {
    /// The cached document for `url`, if present and still valid.
    fn get(&self, url: &str) -> Option<Bytes>;

    /// Store the document fetched from `url`.
    fn put(&self, url: &str, document: Bytes);
}

struct Entry {
    stored_at: Instant,
    document: Bytes,
}

/// A process-local cache with an optional time-to-live.
#[derive(Default)]
pub struct InMemoryCache {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl InMemoryCache {
    /// A cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose entries expire `ttl` after being stored.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() > ttl)
    }
}

impl DescriptionCache for InMemoryCache {
    fn get(&self, url: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(url) {
            Some(entry) if self.is_expired(entry) => {
                entries.remove(url);
                None
            }
            Some(entry) => Some(entry.document.clone()),
            None => None,
        }
    }

    fn put(&self, url: &str, document: Bytes) {
        // A poisoned lock only loses the cache entry.
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                url.to_string(),
                Entry {
                    stored_at: Instant::now(),
                    document,
                },
            );
        }
    }
}
