//! Local caching of the party list.
//!
//! `CacheStore` keeps one JSON snapshot of the parsed party list in a
//! `KeyValueStore` and considers it stale after 60 minutes. Expired or
//! unreadable snapshots are deleted the next time they are read.

pub mod manager;
pub mod storage;

pub use manager::{CacheStore, CachedData, CACHE_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
