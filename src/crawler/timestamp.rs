//! Publication timestamp parsing
//!
//! Article pages express dates either as machine-readable attributes or as
//! rendered text in the site's language (`Senin, 03 Jun 2024 10:30 WIB`,
//! `3 March 2024`). Values without an offset or a known zone suffix are
//! interpreted as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Month names, three-letter and full forms, English and Indonesian
const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("januari", 1),
    ("january", 1),
    ("feb", 2),
    ("februari", 2),
    ("pebruari", 2),
    ("february", 2),
    ("mar", 3),
    ("maret", 3),
    ("march", 3),
    ("apr", 4),
    ("april", 4),
    ("mei", 5),
    ("may", 5),
    ("jun", 6),
    ("juni", 6),
    ("june", 6),
    ("jul", 7),
    ("juli", 7),
    ("july", 7),
    ("agu", 8),
    ("agt", 8),
    ("agustus", 8),
    ("aug", 8),
    ("august", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("okt", 10),
    ("oct", 10),
    ("oktober", 10),
    ("october", 10),
    ("nov", 11),
    ("nopember", 11),
    ("november", 11),
    ("des", 12),
    ("dec", 12),
    ("desember", 12),
    ("december", 12),
];

/// Indonesian time zone abbreviations and their UTC offsets in hours
const ZONES: &[(&str, i32)] = &[("wib", 7), ("wita", 8), ("wit", 9)];

fn zone_offset(name: &str) -> Option<FixedOffset> {
    let name = name.to_lowercase();
    ZONES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .and_then(|(_, hours)| FixedOffset::east_opt(hours * 3600))
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, number)| *number)
}

fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

/// Parses a machine-readable datetime attribute value
///
/// Accepts RFC 3339 (`2024-06-03T10:30:00+07:00`), offset-less date-times
/// and bare `YYYY-MM-DD` dates.
pub fn parse_datetime_attr(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(to_utc(naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| to_utc(date.and_time(NaiveTime::MIN)))
}

/// Finds a `day month year` date in rendered text, with an optional
/// `HH:MM` time directly after the year
///
/// A `WIB`, `WITA` or `WIT` suffix after the time shifts it to UTC.
pub fn parse_localized_date(text: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == ':'))
        .filter(|t| !t.is_empty())
        .collect();

    for (i, window) in tokens.windows(3).enumerate() {
        let day = match window[0].parse::<u32>() {
            Ok(day) if (1..=31).contains(&day) => day,
            _ => continue,
        };
        let Some(month) = month_number(window[1]) else {
            continue;
        };
        if window[2].len() != 4 {
            continue;
        }
        let Ok(year) = window[2].parse::<i32>() else {
            continue;
        };
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };

        let Some(time) = tokens
            .get(i + 3)
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
        else {
            return Some(to_utc(date.and_time(NaiveTime::MIN)));
        };

        let local = date.and_time(time);
        let zoned = tokens
            .get(i + 4)
            .and_then(|t| zone_offset(t))
            .and_then(|offset| offset.from_local_datetime(&local).single())
            .map(|dt| dt.with_timezone(&Utc));

        return Some(zoned.unwrap_or_else(|| to_utc(local)));
    }

    None
}

/// Scans text for the first `YYYY-MM-DD` substring that is a valid date
pub fn scan_iso_date(text: &str) -> Option<DateTime<Utc>> {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return None;
    }

    for start in 0..=bytes.len() - 10 {
        let window = &bytes[start..start + 10];
        let shape_ok = window.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shape_ok {
            continue;
        }

        let digit_before = start > 0 && bytes[start - 1].is_ascii_digit();
        let digit_after = bytes.get(start + 10).map_or(false, |b| b.is_ascii_digit());
        if digit_before || digit_after {
            continue;
        }

        // The window is pure ASCII, so this slice is on char boundaries
        if let Ok(date) = NaiveDate::parse_from_str(&text[start..start + 10], "%Y-%m-%d") {
            return Some(to_utc(date.and_time(NaiveTime::MIN)));
        }
    }

    None
}

/// Parses rendered date text: localized `day month year` first, then a bare
/// ISO date anywhere in the text
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    parse_localized_date(text).or_else(|| scan_iso_date(text))
}
