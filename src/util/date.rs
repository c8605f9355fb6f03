use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Patterns carrying an explicit offset, tried after zone abbreviations have
/// been rewritten to numeric offsets.
const ZONED_PATTERNS: &[&str] = &[
    "%d %b %y %H:%M:%S %z",
    "%d %b %y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%Y/%m/%d %H:%M:%S %z",
];

/// Patterns without an offset; the time is taken as UTC.
const NAIVE_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H:%M:%S",
    "%Y%m%dT%H%M%S",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%Y/%m/%d", "%Y%m%d"];

/// Zone abbreviations seen in the wild, with their offsets.
const ZONES: &[(&str, &str)] = &[
    ("GMT", "+0000"),
    ("UTC", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("AKST", "-0900"),
    ("AKDT", "-0800"),
    ("HST", "-1000"),
    ("BST", "+0100"),
    ("IST", "+0530"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("MET", "+0100"),
    ("MEST", "+0200"),
    ("MEZ", "+0100"),
    ("MESZ", "+0200"),
    ("EET", "+0200"),
    ("EEST", "+0300"),
    ("WET", "+0000"),
    ("WEST", "+0100"),
    ("JST", "+0900"),
    ("KST", "+0900"),
    ("AEST", "+1000"),
    ("AEDT", "+1100"),
    ("NZST", "+1200"),
    ("NZDT", "+1300"),
];

/// Lenient date parser for feed timestamps.
///
/// Accepts RFC 822/2822 dates (with or without weekday, two or four digit
/// years, named zones), ISO 8601 / RFC 3339 timestamps with or without
/// fractional seconds and offset, and bare dates. Returns `None` for
/// anything else.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }

    let normalized = normalize(text);
    let normalized = normalized.as_str();

    for pattern in ZONED_PATTERNS {
        if let Ok(date) = DateTime::parse_from_str(normalized, pattern) {
            return Some(date.with_timezone(&Utc));
        }
    }
    for pattern in NAIVE_PATTERNS {
        if let Ok(date) = NaiveDateTime::parse_from_str(normalized, pattern) {
            return Some(date.and_utc());
        }
    }
    for pattern in DATE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(normalized, pattern) {
            return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
        }
    }

    tracing::trace!(date = text, "Unparseable date");
    None
}

/// Strips the weekday, collapses whitespace, and rewrites the trailing zone
/// into a `+hhmm` offset.
fn normalize(text: &str) -> String {
    let text = match text.split_once(',') {
        Some((day, rest)) if day.trim().chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => text,
    };
    let mut value = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(stripped) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        if stripped.ends_with(|c: char| c.is_ascii_digit()) {
            value = format!("{stripped}+0000");
        }
    }

    if let Some((head, zone)) = value.rsplit_once(' ') {
        let upper = zone.to_ascii_uppercase();
        if let Some((_, offset)) = ZONES.iter().find(|(name, _)| *name == upper) {
            value = format!("{head} {offset}");
        }
    }

    strip_offset_colon(value)
}

/// `+01:00` to `+0100` at the end of the value.
fn strip_offset_colon(value: String) -> String {
    let bytes = value.as_bytes();
    let len = bytes.len();
    if len >= 6
        && matches!(bytes[len - 6], b'+' | b'-')
        && bytes[len - 3] == b':'
        && bytes[len - 5..len - 3].iter().all(u8::is_ascii_digit)
        && bytes[len - 2..].iter().all(u8::is_ascii_digit)
    {
        let mut out = value[..len - 3].to_owned();
        out.push_str(&value[len - 2..]);
        return out;
    }
    value
}
