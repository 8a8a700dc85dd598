//! RSS feed → `PartyRecord` conversion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::document::{parse_document, XmlElement};
use super::error::ItemError;
use super::lookup::{element_text, find_element, first_text};
use super::FeedError;
use crate::models::party::{
    DEFAULT_PARTY_TYPE, DEFAULT_PLATFORM, UNKNOWN_COUNTRY_CODE, UNKNOWN_URL,
};
use crate::models::{country_name, PartyRecord};
use crate::utils::{format_date_range, inner_text, strip_html, truncate_with_ellipsis};

/// At most this many upcoming parties are kept from one feed.
pub const MAX_PARTIES: usize = 12;

const DESCRIPTION_MAX_CHARS: usize = 150;
const LOCATION_MAX_CHARS: usize = 50;

const GENERIC_DESCRIPTION: &str = "Evento da demoscene internacional.";
const INTERNATIONAL: &str = "International";

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Location</dt>\s*<dd>([^<]+)").expect("valid location regex"));
static PLATFORMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Platforms</dt>\s*<dd>([^<]+)").expect("valid platforms regex"));
static TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Type</dt>\s*<dd>([^<]+)").expect("valid type regex"));
static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid paragraph selector"));

/// Parse the feed relative to the current time
pub fn parse_feed(raw: &str) -> Result<Vec<PartyRecord>, FeedError> {
    parse_feed_at(raw, Utc::now())
}

/// Parse the feed, keeping only parties that start after `now`.
///
/// The whole document is rejected when it lacks an XML declaration or is
/// ill-formed. Individual items that cannot be used are skipped.
pub fn parse_feed_at(raw: &str, now: DateTime<Utc>) -> Result<Vec<PartyRecord>, FeedError> {
    let root = parse_document(raw)?;

    let mut parties = Vec::new();
    let mut skipped = 0usize;
    for item in root.descendants().filter(|e| e.name() == "item") {
        match parse_item(item, now) {
            Ok(party) => parties.push(party),
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "Skipping feed item");
            }
        }
    }
    debug!(parsed = parties.len(), skipped = skipped, "Parsed feed items");

    parties.retain(|party| party.is_upcoming(now));
    parties.sort_by_key(|party| party.start_date);
    parties.truncate(MAX_PARTIES);
    Ok(parties)
}

fn parse_item(item: &XmlElement, now: DateTime<Utc>) -> Result<PartyRecord, ItemError> {
    let name = element_text(item, "title");
    if name.is_empty() {
        return Err(ItemError::MissingTitle);
    }

    let link = element_text(item, "link");
    let country_code = first_text(item, &["demopartynet:country", "country"]).to_lowercase();
    let start_text = first_text(item, &["demopartynet:startDate", "startDate"]);
    let end_text = first_text(item, &["demopartynet:endDate", "endDate"]);
    let party_url = first_text(item, &["demopartynet:url", "url"]);
    let attendance = first_text(
        item,
        &["demopartynet:eventAttendanceMode", "eventAttendanceMode"],
    );
    let description = element_text(item, "description");

    // Unparsable start means "now"; unparsable end means "same as start"
    let start_date = parse_feed_date(&start_text).unwrap_or(now);
    let end_date = parse_feed_date(&end_text).unwrap_or(start_date);

    let url = [party_url, link]
        .into_iter()
        .find(|u| !u.is_empty())
        .unwrap_or_else(|| UNKNOWN_URL.to_string());

    Ok(PartyRecord {
        country: display_country(&country_code),
        description: clean_description(&description),
        date_label: format_date_range(&start_date, &end_date),
        start_date,
        end_date,
        location: extract_location(capture(&LOCATION_RE, &description), &country_code),
        url,
        logo: extract_logo(item),
        party_type: capture(&TYPE_RE, &description)
            .map(strip_html)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_PARTY_TYPE.to_string()),
        platforms: extract_platforms(capture(&PLATFORMS_RE, &description)),
        is_online: attendance.contains("Online"),
        country_code: if country_code.is_empty() {
            UNKNOWN_COUNTRY_CODE.to_string()
        } else {
            country_code
        },
        name,
    })
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Lenient date parsing for the start/end fields
pub fn parse_feed_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn display_country(code: &str) -> String {
    if code.is_empty() {
        return INTERNATIONAL.to_string();
    }
    country_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_uppercase())
}

/// First paragraph of the description, shortened for cards.
///
/// `...` is only added when the text was cut; a missing or empty first
/// paragraph gives the generic description.
fn clean_description(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let first_paragraph = fragment.select(&PARAGRAPH).next().map(inner_text);
    match first_paragraph {
        Some(text) if !text.is_empty() => truncate_with_ellipsis(&text, DESCRIPTION_MAX_CHARS),
        _ => GENERIC_DESCRIPTION.to_string(),
    }
}

fn extract_location(location: Option<&str>, country_code: &str) -> String {
    let cleaned = location.map(strip_html).unwrap_or_default();
    if !cleaned.is_empty() {
        return truncate_with_ellipsis(&cleaned, LOCATION_MAX_CHARS);
    }

    // Country name without its trailing flag
    match country_name(country_code) {
        Some(name) => name
            .rsplit_once(' ')
            .map(|(country, _flag)| country)
            .unwrap_or(name)
            .to_string(),
        None => country_code.to_uppercase(),
    }
}

fn extract_platforms(platforms: Option<&str>) -> Vec<String> {
    let list: Vec<String> = platforms
        .map(strip_html)
        .unwrap_or_default()
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if list.is_empty() {
        vec![DEFAULT_PLATFORM.to_string()]
    } else {
        list
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn extract_logo(item: &XmlElement) -> Option<String> {
    find_element(item, "enclosure")
        .and_then(|enclosure| enclosure.attribute("url"))
        .map(str::trim)
        .filter(|url| is_http_url(url))
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn feed(items: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:demopartynet="https://www.demoparty.net/rss">
  <channel>
    <title>demoparty.net</title>
    {}
  </channel>
</rss>"#,
            items.join("\n")
        )
    }

    fn dated_item(title: &str, start: &str) -> String {
        format!(
            "<item><title>{}</title><demopartynet:startDate>{}</demopartynet:startDate></item>",
            title, start
        )
    }

    const REVISION_ITEM: &str = r#"<item>
      <title>Revision 2030</title>
      <link>https://www.demoparty.net/revision/2030</link>
      <description>&lt;p&gt;The biggest pure demoparty in the world.&lt;/p&gt;&lt;dl&gt;&lt;dt&gt;Location&lt;/dt&gt;
        &lt;dd&gt;E-Werk, Saarbrücken&lt;/dd&gt;&lt;dt&gt;Platforms&lt;/dt&gt;&lt;dd&gt;PC, Amiga, , C64&lt;/dd&gt;&lt;dt&gt;Type&lt;/dt&gt;&lt;dd&gt; Demoparty &lt;/dd&gt;&lt;/dl&gt;</description>
      <enclosure url="https://www.demoparty.net/logos/revision.png" type="image/png"/>
      <demopartynet:country>DE</demopartynet:country>
      <demopartynet:startDate>2030-04-19</demopartynet:startDate>
      <demopartynet:endDate>2030-04-22</demopartynet:endDate>
      <demopartynet:url>https://revision-party.net</demopartynet:url>
      <demopartynet:eventAttendanceMode>https://schema.org/OfflineEventAttendanceMode</demopartynet:eventAttendanceMode>
    </item>"#;

    #[test]
    fn test_missing_declaration_is_rejected() {
        let err = parse_feed_at("<rss><channel/></rss>", now()).unwrap_err();
        assert!(matches!(err, FeedError::InvalidDocument(_)));

        let err = parse_feed_at("<html>Service Unavailable</html>", now()).unwrap_err();
        assert!(matches!(err, FeedError::InvalidDocument(_)));
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let xml = "<?xml version=\"1.0\"?><rss><channel><item><title>x</channel></rss>";
        assert!(matches!(
            parse_feed_at(xml, now()),
            Err(FeedError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_full_namespaced_item() {
        let parties = parse_feed_at(&feed(&[REVISION_ITEM.to_string()]), now()).unwrap();
        assert_eq!(parties.len(), 1);

        let p = &parties[0];
        assert_eq!(p.name, "Revision 2030");
        assert_eq!(p.country_code, "de");
        assert_eq!(p.country, "Alemanha 🇩🇪");
        assert_eq!(p.description, "The biggest pure demoparty in the world.");
        assert_eq!(p.date_label, "19 de abril - 22 de abril de 2030");
        assert_eq!(p.start_date, Utc.with_ymd_and_hms(2030, 4, 19, 0, 0, 0).unwrap());
        assert_eq!(p.end_date, Utc.with_ymd_and_hms(2030, 4, 22, 0, 0, 0).unwrap());
        assert_eq!(p.location, "E-Werk, Saarbrücken");
        assert_eq!(p.url, "https://revision-party.net");
        assert_eq!(
            p.logo.as_deref(),
            Some("https://www.demoparty.net/logos/revision.png")
        );
        assert_eq!(p.party_type, "Demoparty");
        assert_eq!(p.platforms, vec!["PC", "Amiga", "C64"]);
        assert!(!p.is_online);
    }

    #[test]
    fn test_plain_tags_and_defaults() {
        let item = r#"<item>
          <title>Online Jam</title>
          <link>https://www.demoparty.net/online-jam</link>
          <description>no paragraphs here</description>
          <enclosure url="ftp://bad"/>
          <country>br</country>
          <startDate>2027-01-10T18:00:00Z</startDate>
          <eventAttendanceMode>https://schema.org/OnlineEventAttendanceMode</eventAttendanceMode>
        </item>"#;
        let parties = parse_feed_at(&feed(&[item.to_string()]), now()).unwrap();
        let p = &parties[0];

        assert_eq!(p.country, "Brasil 🇧🇷");
        assert_eq!(p.location, "Brasil");
        assert_eq!(p.description, "Evento da demoscene internacional.");
        assert_eq!(p.url, "https://www.demoparty.net/online-jam");
        assert_eq!(p.logo, None);
        assert_eq!(p.party_type, "Demoparty");
        assert_eq!(p.platforms, vec!["Multiplatform"]);
        assert!(p.is_online);
        assert_eq!(p.end_date, p.start_date);
        assert_eq!(p.date_label, "10 de janeiro de 2027");
    }

    #[test]
    fn test_items_without_title_are_skipped() {
        let items = vec![
            "<item><demopartynet:startDate>2027-02-01</demopartynet:startDate></item>".to_string(),
            dated_item("   ", "2027-02-02"),
            dated_item("Kept", "2027-02-03"),
        ];
        let parties = parse_feed_at(&feed(&items), now()).unwrap();
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].name, "Kept");
    }

    #[test]
    fn test_unparsable_end_date_falls_back_to_start() {
        let item = "<item><title>Tokyo Demo Fest</title>\
            <demopartynet:startDate>2027-03-05</demopartynet:startDate>\
            <demopartynet:endDate>sometime in spring</demopartynet:endDate></item>";
        let parties = parse_feed_at(&feed(&[item.to_string()]), now()).unwrap();
        assert_eq!(parties[0].end_date, parties[0].start_date);
    }

    #[test]
    fn test_unparsable_start_date_becomes_now() {
        let xml = feed(&[dated_item("Mystery", "TBA")]);
        let root = parse_document(&xml).unwrap();
        let item = root.descendants().find(|e| e.name() == "item").unwrap();

        let party = parse_item(item, now()).unwrap();
        assert_eq!(party.start_date, now());
        assert_eq!(party.end_date, now());

        // ...which is not strictly in the future, so the feed drops it
        assert!(parse_feed_at(&xml, now()).unwrap().is_empty());
    }

    #[test]
    fn test_keeps_twelve_future_parties_sorted() {
        let mut items = Vec::new();
        for i in 0..20i64 {
            // Out of order on purpose
            let offset = (i * 7) % 20 + 1;
            let start = now() + Duration::days(offset);
            items.push(dated_item(&format!("Future {}", offset), &start.to_rfc3339()));
        }
        for i in 1..=5i64 {
            let start = now() - Duration::days(i * 30);
            items.push(dated_item(&format!("Past {}", i), &start.to_rfc3339()));
        }

        let parties = parse_feed_at(&feed(&items), now()).unwrap();
        assert_eq!(parties.len(), MAX_PARTIES);
        assert!(parties.iter().all(|p| p.start_date > now()));
        assert!(parties.windows(2).all(|w| w[0].start_date <= w[1].start_date));
        assert_eq!(parties[0].name, "Future 1");
        assert_eq!(parties[11].name, "Future 12");
    }

    #[test]
    fn test_long_description_and_location_are_truncated() {
        let long_text = "A".repeat(200);
        let long_place = "B".repeat(80);
        let item = format!(
            "<item><title>Long</title><startDate>2027-05-01</startDate>\
             <description><![CDATA[<p class=\"intro\">{}</p><dt>Location</dt><dd>{}</dd>]]></description></item>",
            long_text, long_place
        );
        let parties = parse_feed_at(&feed(&[item]), now()).unwrap();

        assert_eq!(parties[0].description, format!("{}...", "A".repeat(150)));
        assert_eq!(parties[0].location, format!("{}...", "B".repeat(50)));
    }

    fn described_item(description: &str) -> String {
        format!(
            "<item><title>Described</title><startDate>2027-05-01</startDate>\
             <description><![CDATA[{}]]></description></item>",
            description
        )
    }

    fn description_of(description: &str) -> String {
        let parties = parse_feed_at(&feed(&[described_item(description)]), now()).unwrap();
        parties[0].description.clone()
    }

    #[test]
    fn test_description_entities_are_decoded() {
        assert_eq!(
            description_of("<p>Caf&eacute; &#233; party &ndash; S&atilde;o Paulo</p>"),
            "Café é party – São Paulo"
        );
    }

    #[test]
    fn test_unclosed_paragraph_keeps_its_text() {
        assert_eq!(
            description_of("<p>Biggest party in Brazil<dl><dt>Type</dt><dd>Demoparty</dd></dl>"),
            "Biggest party in Brazil"
        );
    }

    #[test]
    fn test_short_and_empty_paragraphs() {
        // Only cut text gets an ellipsis
        assert_eq!(description_of("<p>Short</p>"), "Short");
        assert_eq!(description_of("<p>   </p><p>Second</p>"), "Evento da demoscene internacional.");
        assert_eq!(description_of(""), "Evento da demoscene internacional.");
    }

    #[test]
    fn test_field_captures_decode_entities() {
        let description = "<dl><dt>Location</dt><dd>S&atilde;o Paulo</dd>\
            <dt>Platforms</dt><dd>PC, Amiga &amp; C64</dd>\
            <dt>Type</dt><dd>Demoparty &amp; LAN</dd></dl>";
        let parties = parse_feed_at(&feed(&[described_item(description)]), now()).unwrap();
        let p = &parties[0];

        assert_eq!(p.location, "São Paulo");
        assert_eq!(p.platforms, vec!["PC", "Amiga & C64"]);
        assert_eq!(p.party_type, "Demoparty & LAN");
    }

    #[test]
    fn test_feed_with_byte_order_mark() {
        let xml = format!("\u{feff}{}", feed(&[dated_item("Bom", "2027-05-01")]));
        let parties = parse_feed_at(&xml, now()).unwrap();
        assert_eq!(parties[0].name, "Bom");
    }

    #[test]
    fn test_unknown_and_missing_country() {
        let unknown = "<item><title>Far</title><country>zz</country><startDate>2027-05-01</startDate></item>";
        let missing = "<item><title>Nowhere</title><startDate>2027-05-02</startDate></item>";
        let parties =
            parse_feed_at(&feed(&[unknown.to_string(), missing.to_string()]), now()).unwrap();

        assert_eq!(parties[0].country, "ZZ");
        assert_eq!(parties[0].country_code, "zz");
        assert_eq!(parties[0].location, "ZZ");

        assert_eq!(parties[1].country, "International");
        assert_eq!(parties[1].country_code, "int");
        assert_eq!(parties[1].url, "#");
    }

    #[test]
    fn test_parse_feed_date_formats() {
        let expected = Utc.with_ymd_and_hms(2027, 6, 1, 10, 30, 0).unwrap();
        assert_eq!(parse_feed_date("2027-06-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_feed_date("2027-06-01T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_feed_date("Tue, 01 Jun 2027 10:30:00 +0000"), Some(expected));
        assert_eq!(parse_feed_date("2027-06-01 10:30:00"), Some(expected));
        assert_eq!(
            parse_feed_date("2027-06-01"),
            Some(Utc.with_ymd_and_hms(2027, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_feed_date(""), None);
        assert_eq!(parse_feed_date("next week"), None);
    }
}
