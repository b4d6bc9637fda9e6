//! Kickoff date/time normalization for the two source shapes.
//!
//! - Format A: a `dd/mm/yyyy` date followed somewhere later by an `HH:MM`
//!   time, anywhere inside the rendered text of a match detail page.
//! - Format B: compact `dd/mm/yy HH:MM` table cells; years below 100 are
//!   read as `2000 + yy`.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tracing::warn;

use crate::error::{Result, ScrapeError};
use crate::types::Kickoff;

fn detail_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)(\d{2})/(\d{2})/(\d{4}).*?(\d{2}):(\d{2})")
            .expect("detail date pattern is valid")
    })
}

/// Format A. Searches free text for the first date followed by a time.
pub fn parse_detail_text(text: &str) -> Result<NaiveDateTime> {
    let captures = detail_date_pattern()
        .captures(text)
        .ok_or_else(|| ScrapeError::DateNotFound(excerpt(text)))?;

    let field = |idx: usize| -> Option<u32> { captures.get(idx)?.as_str().parse().ok() };
    let (Some(day), Some(month), Some(hour), Some(minute)) = (field(1), field(2), field(4), field(5))
    else {
        return Err(ScrapeError::DateNotFound(excerpt(text)));
    };
    let year = captures
        .get(3)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .ok_or_else(|| ScrapeError::DateNotFound(excerpt(text)))?;

    build_datetime(year, month, day, hour, minute).ok_or_else(|| ScrapeError::DateNotFound(excerpt(text)))
}

/// Format B. `24/02/26 20:30`, also accepting four-digit years.
pub fn parse_table_cell(cell: &str) -> Result<NaiveDateTime> {
    let not_found = || ScrapeError::DateNotFound(cell.to_string());

    let mut parts = cell.split_whitespace();
    let date = parts.next().ok_or_else(not_found)?;
    let time = parts.next().ok_or_else(not_found)?;

    let mut date_parts = date.split('/').map(|p| p.trim().parse::<i32>());
    let (Some(Ok(day)), Some(Ok(month)), Some(Ok(mut year))) =
        (date_parts.next(), date_parts.next(), date_parts.next())
    else {
        return Err(not_found());
    };
    if year < 100 {
        year += 2000;
    }

    let (hour, minute) = time.split_once(':').ok_or_else(not_found)?;
    let hour: u32 = hour.trim().parse().map_err(|_| not_found())?;
    let minute: u32 = minute.trim().parse().map_err(|_| not_found())?;

    if day < 1 || month < 1 {
        return Err(not_found());
    }
    build_datetime(year, month as u32, day as u32, hour, minute).ok_or_else(not_found)
}

/// Turns a parse outcome into a kickoff, substituting scrape time when the
/// date could not be read.
pub fn resolve_kickoff(parsed: Result<NaiveDateTime>, context: &str) -> Kickoff {
    match parsed {
        Ok(at) => Kickoff::parsed(at),
        Err(e) => {
            let kickoff = Kickoff::fallback_now();
            warn!(
                "No kickoff for {}: {}. Using scrape time {} (marked as estimated)",
                context, e, kickoff.at
            );
            kickoff
        }
    }
}

fn build_datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

fn excerpt(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(80).collect()
}
