use std::fmt;

use super::PartyRecord;

/// Localized (pt-BR) display name for a lowercase country code
pub fn country_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "dk" => "Dinamarca 🇩🇰",
        "ar" => "Argentina 🇦🇷",
        "se" => "Suécia 🇸🇪",
        "es" => "Espanha 🇪🇸",
        "fr" => "França 🇫🇷",
        "de" => "Alemanha 🇩🇪",
        "us" => "Estados Unidos 🇺🇸",
        "pl" => "Polônia 🇵🇱",
        "pt" => "Portugal 🇵🇹",
        "jp" => "Japão 🇯🇵",
        "ru" => "Rússia 🇷🇺",
        "be" => "Bélgica 🇧🇪",
        "br" => "Brasil 🇧🇷",
        "mx" => "México 🇲🇽",
        "cl" => "Chile 🇨🇱",
        "co" => "Colômbia 🇨🇴",
        "uy" => "Uruguai 🇺🇾",
        "pe" => "Peru 🇵🇪",
        "fi" => "Finlândia 🇫🇮",
        "no" => "Noruega 🇳🇴",
        "nl" => "Holanda 🇳🇱",
        "gb" => "Reino Unido 🇬🇧",
        "it" => "Itália 🇮🇹",
        "hu" => "Hungria 🇭🇺",
        "ca" => "Canadá 🇨🇦",
        "ch" => "Suíça 🇨🇭",
        "at" => "Áustria 🇦🇹",
        "cz" => "Tchéquia 🇨🇿",
        "kr" => "Coreia do Sul 🇰🇷",
        "cn" => "China 🇨🇳",
        _ => return None,
    };
    Some(name)
}

/// Fixed grouping buckets for the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    SouthAmerica,
    Europe,
    NorthAmerica,
    Asia,
    Online,
    Other,
}

impl Region {
    /// Display order of the buckets.
    pub const ALL: [Region; 6] = [
        Region::SouthAmerica,
        Region::Europe,
        Region::NorthAmerica,
        Region::Asia,
        Region::Online,
        Region::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Region::SouthAmerica => "South America",
            Region::Europe => "Europe",
            Region::NorthAmerica => "North America",
            Region::Asia => "Asia",
            Region::Online => "Online",
            Region::Other => "Other",
        }
    }

    /// Geographic bucket for a country code. Never returns `Online`.
    pub fn for_country(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "br" | "ar" | "cl" | "co" | "uy" | "pe" => Region::SouthAmerica,
            "de" | "fr" | "es" | "se" | "dk" | "pl" | "pt" | "be" | "fi" | "no" | "nl" | "gb"
            | "it" | "ch" | "at" | "cz" | "hu" => Region::Europe,
            "us" | "ca" | "mx" => Region::NorthAmerica,
            "jp" | "kr" | "cn" => Region::Asia,
            _ => Region::Other,
        }
    }

    /// Online parties always land in `Online`, whatever their country
    pub fn for_party(party: &PartyRecord) -> Self {
        if party.is_online {
            Region::Online
        } else {
            Self::for_country(&party.country_code)
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
