//! Static party list shown when the feed cannot be fetched or parsed.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{country_name, PartyRecord};
use crate::utils::format_date_range;

struct FallbackEntry {
    name: &'static str,
    country_code: &'static str,
    description: &'static str,
    start: (i32, u32, u32),
    end: (i32, u32, u32),
    location: &'static str,
    url: &'static str,
    party_type: &'static str,
    platforms: &'static [&'static str],
    is_online: bool,
}

const FALLBACK_ENTRIES: [FallbackEntry; 6] = [
    FallbackEntry {
        name: "Demoparty Brasil 2025",
        country_code: "br",
        description: "A primeira grande demoparty brasileira, com competições, workshops e palestras.",
        start: (2025, 5, 15),
        end: (2025, 5, 17),
        location: "São Paulo, Brasil",
        url: "#",
        party_type: "Demoparty",
        platforms: &["Multiplatform"],
        is_online: false,
    },
    FallbackEntry {
        name: "TRSAC 2025",
        country_code: "dk",
        description: "Uma das principais demoparties da Europa, com foco em plataformas clássicas e modernas.",
        start: (2025, 10, 17),
        end: (2025, 10, 19),
        location: "Aarhus, Dinamarca",
        url: "https://trsac.dk",
        party_type: "Demoparty",
        platforms: &["Multiplatform"],
        is_online: false,
    },
    FallbackEntry {
        name: "Flashparty 2025",
        country_code: "ar",
        description: "A demoparty argentina com foco em arte ASCII, chiptune e desenvolvimento de jogos independentes.",
        start: (2025, 10, 18),
        end: (2025, 10, 18),
        location: "Buenos Aires, Argentina",
        url: "https://flashparty.ar",
        party_type: "Demoparty",
        platforms: &["Multiplatform"],
        is_online: false,
    },
    FallbackEntry {
        name: "Comparade 2025",
        country_code: "de",
        description: "Party como nos velhos tempos! Entrada gratuita, BBQ grátis, acts ao vivo e competições.",
        start: (2025, 11, 7),
        end: (2025, 11, 9),
        location: "Emmering, Alemanha",
        url: "https://comparade.de",
        party_type: "Demoparty",
        platforms: &["Multiplatform", "PC", "Amiga", "C64", "Amstrad CPC"],
        is_online: false,
    },
    FallbackEntry {
        name: "Demosplash 2025",
        country_code: "us",
        description: "Demoparty americana em Pittsburgh com competições multiplatforma.",
        start: (2025, 10, 31),
        end: (2025, 11, 1),
        location: "Pittsburgh, Estados Unidos",
        url: "https://www.demosplash.org/",
        party_type: "Demoparty",
        platforms: &["Multiplatform"],
        is_online: false,
    },
    FallbackEntry {
        name: "Transmission64 2025",
        country_code: "be",
        description: "A demoparty online dedicada ao Commodore 64.",
        start: (2025, 11, 29),
        end: (2025, 11, 29),
        location: "Online",
        url: "https://transmission64.com",
        party_type: "Online Demoparty",
        platforms: &["C64"],
        is_online: true,
    },
];

fn utc_midnight((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

impl FallbackEntry {
    fn to_record(&self) -> PartyRecord {
        let start_date = utc_midnight(self.start);
        let end_date = utc_midnight(self.end);
        PartyRecord {
            name: self.name.to_string(),
            country: country_name(self.country_code)
                .map(str::to_string)
                .unwrap_or_else(|| self.country_code.to_uppercase()),
            country_code: self.country_code.to_string(),
            description: self.description.to_string(),
            date_label: format_date_range(&start_date, &end_date),
            start_date,
            end_date,
            location: self.location.to_string(),
            url: self.url.to_string(),
            logo: None,
            party_type: self.party_type.to_string(),
            platforms: self.platforms.iter().map(|p| p.to_string()).collect(),
            is_online: self.is_online,
        }
    }
}

/// The fixed illustrative party list
pub fn fallback_parties() -> Vec<PartyRecord> {
    FALLBACK_ENTRIES.iter().map(FallbackEntry::to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    #[test]
    fn test_fallback_is_fixed_and_deterministic() {
        let parties = fallback_parties();
        assert_eq!(parties.len(), 6);
        assert_eq!(parties, fallback_parties());
        assert!(parties.iter().all(|p| !p.name.is_empty()));
        assert!(parties.iter().all(|p| p.start_date <= p.end_date));
    }

    #[test]
    fn test_fallback_records_are_localized() {
        let parties = fallback_parties();
        assert_eq!(parties[0].country, "Brasil 🇧🇷");
        assert_eq!(parties[0].date_label, "15 de maio - 17 de maio de 2025");
        assert_eq!(parties[2].date_label, "18 de outubro de 2025");
    }

    #[test]
    fn test_transmission64_is_online() {
        let online: Vec<_> = fallback_parties()
            .into_iter()
            .filter(|p| p.region() == Region::Online)
            .collect();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].name, "Transmission64 2025");
    }
}
