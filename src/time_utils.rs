// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan date rendering and parsing.

use chrono::{DateTime, NaiveDate, Utc};

/// Short US-style date (`M/D/YYYY`), as shown to athletes and the model.
pub fn format_short_date(date: DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Parse a calendar day (`YYYY-MM-DD`) or a full RFC3339 timestamp into
/// midnight UTC of that day.
pub fn parse_plan_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}
