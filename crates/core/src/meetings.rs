//! Weekly meeting arithmetic
//!
//! Pure calendar logic shared by the meeting generator, the active-meeting
//! locator and the meeting shifter. Storage orchestration lives in
//! `storage::calendar`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{Error, Result};
use crate::models::{CalendarEntry, MEETING_WINDOW_DAYS};

/// Most meetings a single generation may produce
pub const MAX_MEETINGS: u32 = 20;

/// How many entries the locator inspects. Windows are contiguous and
/// non-overlapping, so the active one is always among the most recently
/// started few.
pub const LOCATOR_CANDIDATES: usize = 5;

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Build `count` weekly meeting windows starting at `start_date`.
///
/// Meeting `n` starts `7 * (n - 1)` days after `start_date` and spans
/// exactly seven days.
pub fn build_weekly_meetings(start_date: NaiveDate, count: u32) -> Result<Vec<CalendarEntry>> {
    if count == 0 || count > MAX_MEETINGS {
        return Err(Error::InvalidCount(count));
    }

    let entries = (1..=count)
        .map(|n| {
            let offset = Duration::days(MEETING_WINDOW_DAYS * i64::from(n - 1));
            CalendarEntry::meeting(n, start_date + offset)
        })
        .collect();

    Ok(entries)
}

/// Pick the window containing `today` from candidates ordered
/// newest-start-first. The non-overlap invariant rules out ties, and a gap
/// (before the first meeting, or an unscheduled period) is a valid
/// non-result rather than an error.
pub fn active_entry(candidates: &[CalendarEntry], today: NaiveDate) -> Option<&CalendarEntry> {
    candidates.iter().find(|entry| entry.contains(today))
}

/// Rewrite the dates of every meeting after an edited one so weekly cadence
/// continues uninterrupted from `edited_start`, whatever the dates were
/// before. `following` must be ordered ascending by sequence number; only
/// dates change, never sequence numbers.
pub fn rebase_following(edited_start: NaiveDate, following: &mut [CalendarEntry]) {
    let mut cursor = edited_start;
    for entry in following {
        cursor += Duration::days(MEETING_WINDOW_DAYS);
        entry.start_date = cursor;
        entry.end_date = cursor + Duration::days(MEETING_WINDOW_DAYS - 1);
    }
}

/// The concrete date a course held on `day` falls on inside a meeting window
pub fn lecture_date(entry: &CalendarEntry, day: Weekday) -> NaiveDate {
    let base = entry.start_date.weekday().num_days_from_monday() as i64;
    let target = day.num_days_from_monday() as i64;
    entry.start_date + Duration::days((target - base + 7) % 7)
}
