//! demoparty.net feed acquisition.
//!
//! - `FeedFetcher`: direct request with ordered relay fallback
//! - `parse_feed`: RSS text to upcoming `PartyRecord`s
//!
//! Fetch errors at a single source are handled locally; only exhaustion of
//! every source, an invalid document or a bad configuration reach callers
//! as a `FeedError`.

pub mod document;
pub mod error;
pub mod fetcher;
pub mod lookup;
pub mod parser;

pub use error::{FeedError, ItemError};
pub use fetcher::{FeedFetcher, HttpTransport, Relay, ReqwestTransport};
pub use parser::{parse_feed, parse_feed_at};
