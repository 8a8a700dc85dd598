use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{KeyValueStore, StorageError};
use crate::clock::{Clock, SystemClock};
use crate::models::PartyRecord;

/// Storage key for the party snapshot. Rename it when the schema changes.
pub const CACHE_KEY: &str = "demoscene-parties-cache";

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    #[serde(rename = "parties")]
    pub data: T,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let minutes = self.age_minutes(now);
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.cached_at > Duration::minutes(CACHE_STALE_MINUTES)
    }
}

/// Time-boxed snapshot of the party list on top of a `KeyValueStore`.
///
/// Writes are best-effort: failures are logged and never reach the caller.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            key: CACHE_KEY.to_string(),
        }
    }

    fn load<T: DeserializeOwned>(&self) -> Result<Option<CachedData<T>>, StorageError> {
        match self.store.get(&self.key)? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    fn remove(&self) {
        if let Err(e) = self.store.delete(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to delete cache entry");
        }
    }

    /// Store `parties` stamped with the current time
    pub fn put(&self, parties: &[PartyRecord]) {
        let cached = CachedData::new(parties, self.clock.now());
        let result = serde_json::to_string(&cached)
            .map_err(StorageError::from)
            .and_then(|contents| self.store.set(&self.key, &contents));

        match result {
            Ok(()) => debug!(count = parties.len(), "Saved parties to cache"),
            Err(e) => warn!(key = %self.key, error = %e, "Could not save parties to cache"),
        }
    }

    /// Fresh cached parties, if any. Expired or unreadable entries are deleted.
    pub fn get(&self) -> Option<Vec<PartyRecord>> {
        match self.load::<Vec<PartyRecord>>() {
            Ok(Some(cached)) if cached.is_stale(self.clock.now()) => {
                debug!(key = %self.key, "Cache entry expired");
                self.remove();
                None
            }
            Ok(Some(cached)) => Some(cached.data),
            Ok(None) => None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read cache");
                self.remove();
                None
            }
        }
    }

    pub fn clear(&self) {
        self.remove();
    }

    /// Whether a refresh is needed. Missing or unreadable entries count as stale.
    pub fn is_stale(&self) -> bool {
        match self.load::<serde_json::Value>() {
            Ok(Some(cached)) => cached.is_stale(self.clock.now()),
            Ok(None) => true,
            Err(e) => {
                debug!(key = %self.key, error = %e, "Failed to load cache for staleness check");
                true
            }
        }
    }

    /// When the current snapshot was written, without touching the store
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.load::<serde_json::Value>()
            .ok()
            .flatten()
            .map(|cached| cached.cached_at)
    }

    /// "5m ago" style age of the current snapshot
    pub fn age_display(&self) -> Option<String> {
        let now = self.clock.now();
        self.load::<serde_json::Value>()
            .ok()
            .flatten()
            .map(|cached| cached.age_display(now))
    }
}

// ============================================================================
// Tests
// ============================================================================
