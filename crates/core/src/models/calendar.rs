//! Academic calendar entries

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of one weekly meeting window in days (start and end inclusive)
pub const MEETING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A numbered weekly meeting
    Meeting,
    /// Anything else on the calendar: exam period, holiday, ...
    Other,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Meeting => "meeting",
            EntryKind::Other => "other",
        }
    }
}

/// A named date window on the academic calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub kind: EntryKind,
    /// Meeting order; editing a meeting's dates never changes this
    pub sequence: Option<u32>,
}

impl CalendarEntry {
    /// Deterministic identifier for meeting `sequence`
    pub fn meeting_id(sequence: u32) -> String {
        format!("meeting_{sequence}")
    }

    /// A weekly meeting window starting at `start_date`
    pub fn meeting(sequence: u32, start_date: NaiveDate) -> Self {
        Self {
            id: Self::meeting_id(sequence),
            title: format!("Meeting {sequence}"),
            start_date,
            end_date: start_date + Duration::days(MEETING_WINDOW_DAYS - 1),
            kind: EntryKind::Meeting,
            sequence: Some(sequence),
        }
    }

    /// An ad-hoc entry (exam period, holiday) with an opaque identifier
    pub fn other(title: String, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            start_date,
            end_date,
            kind: EntryKind::Other,
            sequence: None,
        }
    }

    /// Whether `date` falls inside this window, both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_meeting(&self) -> bool {
        self.kind == EntryKind::Meeting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn window_contains_both_ends() {
        let entry = CalendarEntry::meeting(1, start());
        assert!(entry.contains(entry.start_date));
        assert!(entry.contains(entry.end_date));
        assert!(!entry.contains(entry.start_date - Duration::days(1)));
        assert!(!entry.contains(entry.end_date + Duration::days(1)));
    }

    #[test]
    fn meeting_identity_is_deterministic() {
        let entry = CalendarEntry::meeting(3, start());
        assert_eq!(entry.id, "meeting_3");
        assert_eq!(entry.title, "Meeting 3");
        assert_eq!(entry.sequence, Some(3));
        assert_eq!(entry.end_date, start() + Duration::days(6));

        // Ad-hoc entries get opaque identifiers instead.
        let exam = CalendarEntry::other("Final exams".into(), start(), start());
        assert!(!exam.id.starts_with("meeting_"));
        assert!(exam.sequence.is_none());
    }

    #[test]
    fn serializes_for_the_dashboard() {
        let entry = CalendarEntry::meeting(1, start());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "meeting_1");
        assert_eq!(json["kind"], "Meeting");
        assert_eq!(json["sequence"], 1);
        assert_eq!(json["start_date"], "2025-09-01");
    }
}
