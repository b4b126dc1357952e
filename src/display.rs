//! Dates as readers see them. Rows store UTC `datetime('now')` text.

use chrono::{NaiveDateTime, Utc};

const STORED: &str = "%Y-%m-%d %H:%M:%S";

fn parse(stored: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stored, STORED).ok()
}

/// Calendar date for post bylines, e.g. `15 April 2022`.
pub fn publication_date(stored: &str) -> String {
    parse(stored)
        .map(|dt| dt.format("%-d %B %Y").to_string())
        .unwrap_or_else(|| stored.to_string())
}

/// Value for a `<time datetime="...">` attribute.
pub fn machine_time(stored: &str) -> String {
    parse(stored)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// Comment stamp: relative for the first day, then date and time.
pub fn comment_stamp(stored: &str) -> String {
    match parse(stored) {
        Some(dt) => comment_stamp_at(&dt, Utc::now().naive_utc()),
        None => stored.to_string(),
    }
}

fn comment_stamp_at(dt: &NaiveDateTime, now: NaiveDateTime) -> String {
    let age = now.signed_duration_since(*dt);
    let minutes = age.num_minutes();
    let hours = age.num_hours();

    if minutes < 1 {
        "a moment ago".to_string()
    } else if hours < 1 {
        ago(minutes, "minute")
    } else if hours < 24 {
        ago(hours, "hour")
    } else {
        dt.format("%-d %B %Y, %H:%M").to_string()
    }
}

fn ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
