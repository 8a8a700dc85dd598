//! Party listing service.
//!
//! `PartyService` ties the pieces together: cache-first reads, feed fetch
//! and parse on a miss, fallback data when the feed is unavailable, and the
//! derived views the listing page shows (upcoming, per region, counters).

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStore, FileStore};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::fallback::fallback_parties;
use crate::feed::{parse_feed_at, FeedError, FeedFetcher};
use crate::models::{PartyRecord, Region};

/// Message shown to the user when loading fails outright.
pub const LOAD_ERROR_MESSAGE: &str = "Erro ao carregar eventos";

/// Busy/error flags for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartyStats {
    pub total: usize,
    pub upcoming: usize,
    pub online: usize,
    pub this_month: usize,
}

/// Every region bucket, in display order, with the parties that fall in it
pub fn group_by_region(parties: &[PartyRecord]) -> Vec<(Region, Vec<&PartyRecord>)> {
    Region::ALL
        .iter()
        .map(|&region| {
            let members = parties.iter().filter(|p| p.region() == region).collect();
            (region, members)
        })
        .collect()
}

pub fn compute_stats(parties: &[PartyRecord], now: DateTime<Utc>) -> PartyStats {
    let upcoming: Vec<&PartyRecord> = parties.iter().filter(|p| p.is_upcoming(now)).collect();
    PartyStats {
        total: parties.len(),
        upcoming: upcoming.len(),
        online: parties.iter().filter(|p| p.is_online).count(),
        this_month: upcoming.iter().filter(|p| p.starts_in_month(now)).count(),
    }
}

pub struct PartyService {
    fetcher: FeedFetcher,
    cache: CacheStore,
    clock: Arc<dyn Clock>,
    parties: Vec<PartyRecord>,
    last_updated: Option<DateTime<Utc>>,
    state: watch::Sender<LoadState>,
}

impl PartyService {
    pub fn new(fetcher: FeedFetcher, cache: CacheStore) -> Self {
        Self::with_clock(fetcher, cache, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: FeedFetcher, cache: CacheStore, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(LoadState::default());
        Self {
            fetcher,
            cache,
            clock,
            parties: Vec::new(),
            last_updated: None,
            state,
        }
    }

    /// HTTP fetcher plus a file-backed cache in the configured cache directory
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = FeedFetcher::new(config).context("Failed to create feed fetcher")?;
        let cache_dir = config.cache_dir()?;
        let store = FileStore::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache directory {}", cache_dir.display()))?;
        Ok(Self::new(fetcher, CacheStore::new(Arc::new(store))))
    }

    // ===== Observable State =====

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    fn set_state(&self, loading: bool, error: Option<String>) {
        self.state.send_replace(LoadState { loading, error });
    }

    // ===== Loading =====

    /// Populate the party list.
    ///
    /// With `use_cache`, a fresh cache entry is used as-is and nothing is
    /// fetched. Otherwise the feed is fetched and parsed, falling back to the
    /// static list when the feed is unavailable; the result is cached.
    pub async fn load_parties(&mut self, use_cache: bool) {
        self.set_state(true, None);

        if use_cache && self.load_from_cache() {
            debug!(count = self.parties.len(), "Using cached parties");
            self.set_state(false, None);
            return;
        }

        match self.fetch_fresh().await {
            Ok(parties) => {
                info!(count = parties.len(), "Loaded parties");
                self.save_to_cache(&parties);
                self.parties = parties;
                self.set_state(false, None);
            }
            Err(e) => {
                error!(error = %e, "Failed to load parties");
                self.set_state(false, Some(LOAD_ERROR_MESSAGE.to_string()));
            }
        }
    }

    async fn fetch_fresh(&self) -> Result<Vec<PartyRecord>, FeedError> {
        let parsed = match self.fetcher.fetch().await {
            Ok(raw) => parse_feed_at(&raw, self.clock.now()),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(parties) => Ok(parties),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Feed unavailable, using fallback parties");
                Ok(fallback_parties())
            }
            Err(e) => Err(e),
        }
    }

    // ===== Cache =====

    /// Replace the list with the cached one, if it is still fresh
    pub fn load_from_cache(&mut self) -> bool {
        match self.cache.get() {
            Some(parties) => {
                self.parties = parties;
                self.last_updated = self.cache.cached_at();
                true
            }
            None => false,
        }
    }

    pub fn save_to_cache(&mut self, parties: &[PartyRecord]) {
        self.cache.put(parties);
        self.last_updated = Some(self.clock.now());
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.parties.clear();
        self.last_updated = None;
    }

    /// True when there is no fresh cache entry
    pub fn needs_update(&self) -> bool {
        self.cache.is_stale()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn cache_age(&self) -> Option<String> {
        self.cache.age_display()
    }

    // ===== Views =====

    pub fn parties(&self) -> &[PartyRecord] {
        &self.parties
    }

    pub fn upcoming_parties(&self) -> Vec<&PartyRecord> {
        let now = self.clock.now();
        self.parties.iter().filter(|p| p.is_upcoming(now)).collect()
    }

    pub fn parties_by_region(&self) -> Vec<(Region, Vec<&PartyRecord>)> {
        group_by_region(&self.parties)
    }

    pub fn stats(&self) -> PartyStats {
        compute_stats(&self.parties, self.clock.now())
    }
}

// ============================================================================
// Tests
// ============================================================================
