//! Core library for demoparty.
//!
//! Fetches the demoparty.net RSS feed (directly or through relay proxies),
//! parses it into `PartyRecord`s, falls back to static data when the feed is
//! unreachable and keeps the result in a one-hour key-value cache.

pub mod cache;
pub mod clock;
pub mod config;
pub mod fallback;
pub mod feed;
pub mod models;
pub mod service;
pub mod utils;

pub use cache::{CacheStore, CachedData, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use feed::{FeedError, FeedFetcher, HttpTransport, Relay, ReqwestTransport};
pub use models::{PartyRecord, Region};
pub use service::{LoadState, PartyService, PartyStats, LOAD_ERROR_MESSAGE};
