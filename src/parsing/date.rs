use chrono::{DateTime, Utc};

/// Patterns tried in order against a trimmed timestamp.
///
/// RFC-822 forms come first because RSS `pubDate` dominates the feeds we read.
const FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.3f%:z",
];

/// Looser forms for timestamps the fixed patterns reject: a weekday that
/// disagrees with the date, or a missing weekday.
const RELAXED_FORMATS: &[&str] = &["%d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M %z"];

/// Parses a feed timestamp, returning `None` when no known format matches.
///
/// Weekday and month names are always read as English tokens.
pub fn try_parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    // Zulu suffixes and arbitrary fractional precision
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    // Named zones such as GMT or EST
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let without_weekday = raw.split_once(',').map(|(_, rest)| rest.trim()).unwrap_or(raw);
    RELAXED_FORMATS.iter().find_map(|format| {
        DateTime::parse_from_str(without_weekday, format)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    })
}

/// Total variant of [`try_parse_date`]: anything unparseable becomes `now`.
pub fn parse_date_or(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match try_parse_date(raw) {
        Some(parsed) => parsed,
        None => {
            tracing::debug!(raw = %raw, "Unparseable date, using current time");
            now
        }
    }
}

/// Parses a feed timestamp, falling back to the current instant.
pub fn parse_date(raw: &str) -> DateTime<Utc> {
    parse_date_or(raw, Utc::now())
}
