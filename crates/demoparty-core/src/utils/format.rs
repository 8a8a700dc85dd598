use chrono::{DateTime, Datelike, Utc};
use scraper::{ElementRef, Html};

/// Portuguese month names, January first.
const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` characters, appending "..." when anything was cut
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// Text content of an element, whitespace collapsed
pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Plain text of an HTML fragment, with entities decoded
pub fn strip_html(html: &str) -> String {
    inner_text(Html::parse_fragment(html).root_element())
}

fn month_name(date: &DateTime<Utc>) -> &'static str {
    MONTHS_PT_BR[date.month0() as usize]
}

/// pt-BR display label for a date range.
///
/// Same calendar day: "15 de maio de 2025".
/// Otherwise: "15 de maio - 17 de maio de 2025".
pub fn format_date_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    let end_label = format!("{} de {} de {}", end.day(), month_name(end), end.year());
    if start.date_naive() == end.date_naive() {
        return end_label;
    }
    format!("{} de {} - {}", start.day(), month_name(start), end_label)
}
