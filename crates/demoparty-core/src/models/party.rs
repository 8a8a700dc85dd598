use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::Region;

/// Sentinel country code for parties with no known country.
pub const UNKNOWN_COUNTRY_CODE: &str = "int";

/// Sentinel URL for parties with no known link.
pub const UNKNOWN_URL: &str = "#";

pub const DEFAULT_PARTY_TYPE: &str = "Demoparty";

pub const DEFAULT_PLATFORM: &str = "Multiplatform";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRecord {
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub description: String,
    pub date_label: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "type")]
    pub party_type: String,
    pub platforms: Vec<String>,
    #[serde(default)]
    pub is_online: bool,
}

impl PartyRecord {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_date > now
    }

    /// True when the party starts in the same month and year as `now`
    pub fn starts_in_month(&self, now: DateTime<Utc>) -> bool {
        self.start_date.month() == now.month() && self.start_date.year() == now.year()
    }

    pub fn region(&self) -> Region {
        Region::for_party(self)
    }

    pub fn platforms_display(&self) -> String {
        self.platforms.join(", ")
    }
}
