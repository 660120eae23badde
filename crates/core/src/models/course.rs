//! Weekly course sessions (the timetable)

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Minutes-of-day used when a session has no explicit end time
pub const CLOSE_OF_DAY_MINUTES: u32 = 23 * 60 + 59;

/// One weekly class slot: subject, class, instructor, weekday and time window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSession {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub class_label: String,
    /// NIP of the lecturer teaching this session
    pub lecturer_no: String,
    pub day: Weekday,
    pub starts: NaiveTime,
    /// Missing end time behaves as end of day
    pub ends: Option<NaiveTime>,
}

impl CourseSession {
    pub fn new(
        code: String,
        name: String,
        class_label: String,
        lecturer_no: String,
        day: Weekday,
        starts: NaiveTime,
        ends: Option<NaiveTime>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.trim().to_uppercase(),
            name,
            class_label: class_label.trim().to_uppercase(),
            lecturer_no,
            day,
            starts,
            ends,
        }
    }

    pub fn start_minutes(&self) -> u32 {
        minutes_of(self.starts)
    }

    pub fn end_minutes(&self) -> u32 {
        self.ends.map(minutes_of).unwrap_or(CLOSE_OF_DAY_MINUTES)
    }
}

/// Minutes since midnight
pub fn minutes_of(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Parse a clock string; both `08.00` and `08:00` forms are accepted
pub fn parse_clock(s: &str) -> Result<NaiveTime> {
    let normalized = s.trim().replace('.', ":");
    NaiveTime::parse_from_str(&normalized, "%H:%M")
        .map_err(|_| Error::InvalidDate(format!("unparsable clock time: {s}")))
}

/// Parse a weekday from its name ("monday", "Mon", ...)
pub fn parse_day(s: &str) -> Result<Weekday> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| Error::InvalidOperation(format!("unknown day: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accepts_dot_and_colon() {
        let dotted = parse_clock("08.00").unwrap();
        let colon = parse_clock("08:00").unwrap();
        assert_eq!(dotted, colon);
        assert_eq!(minutes_of(dotted), 480);
    }

    #[test]
    fn clock_rejects_garbage() {
        assert!(parse_clock("siang").is_err());
        assert!(parse_clock("25:00").is_err());
    }

    #[test]
    fn missing_end_time_runs_to_close_of_day() {
        let session = CourseSession::new(
            "if101".into(),
            "Algorithms".into(),
            "ih1".into(),
            "198801".into(),
            Weekday::Mon,
            parse_clock("08.00").unwrap(),
            None,
        );
        assert_eq!(session.code, "IF101");
        assert_eq!(session.class_label, "IH1");
        assert_eq!(session.end_minutes(), CLOSE_OF_DAY_MINUTES);
    }
}
