//! Data models for demoparty listings.
//!
//! - `PartyRecord`: one scene event as shown on the site
//! - `Region`: geographic/online buckets used to group parties
//! - `country_name`: static country-code lookup

pub mod party;
pub mod region;

pub use party::PartyRecord;
pub use region::{country_name, Region};
