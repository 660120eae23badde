//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use rusqlite::Error as SqlError;
use uuid::Uuid;

use crate::models::{AttendanceStatus, EnrollmentState, EntryKind, Role};

fn conversion_failure<E>(e: E) -> SqlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(conversion_failure)
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_failure)
}

/// Parse an optional DateTime from an RFC3339 string
pub fn parse_datetime_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, SqlError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Parse a calendar date from a `YYYY-MM-DD` string
pub fn parse_date(s: &str) -> Result<NaiveDate, SqlError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conversion_failure)
}

/// Parse an optional calendar date
pub fn parse_date_opt(s: Option<String>) -> Result<Option<NaiveDate>, SqlError> {
    s.map(|s| parse_date(&s)).transpose()
}

/// Parse a clock time from an `HH:MM` string
pub fn parse_time(s: &str) -> Result<NaiveTime, SqlError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(conversion_failure)
}

/// Parse an optional clock time
pub fn parse_time_opt(s: Option<String>) -> Result<Option<NaiveTime>, SqlError> {
    s.map(|s| parse_time(&s)).transpose()
}

/// Convert a stored day index (0 = Monday) to a Weekday
pub fn day_from_u8(value: u8) -> Weekday {
    match value {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Convert a stored role string to Role
pub fn role_from_str(value: &str) -> Role {
    match value {
        "admin" => Role::Admin,
        "lecturer" => Role::Lecturer,
        _ => Role::Student,
    }
}

/// Convert a stored entry kind string to EntryKind
pub fn kind_from_str(value: &str) -> EntryKind {
    match value {
        "meeting" => EntryKind::Meeting,
        _ => EntryKind::Other,
    }
}

/// Convert a stored attendance status string to AttendanceStatus
pub fn status_from_str(value: &str) -> AttendanceStatus {
    match value {
        "present" => AttendanceStatus::Present,
        "excused" => AttendanceStatus::ExcusedLeave,
        "sick" => AttendanceStatus::Sick,
        _ => AttendanceStatus::Absent,
    }
}

/// Convert a stored enrollment state string to EnrollmentState
pub fn enrollment_from_str(value: &str) -> EnrollmentState {
    match value {
        "taken" => EnrollmentState::Taken,
        _ => EnrollmentState::Declined,
    }
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
