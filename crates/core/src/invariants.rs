//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use chrono::Duration;

use crate::models::{
    AttendanceRecord, AttendanceStatus, CalendarEntry, MEETING_WINDOW_DAYS,
};

/// Validate that a single calendar entry is internally consistent
pub fn assert_entry_invariants(entry: &CalendarEntry) {
    debug_assert!(
        entry.start_date <= entry.end_date,
        "Entry {} ends ({}) before it starts ({})",
        entry.id,
        entry.end_date,
        entry.start_date
    );

    debug_assert!(
        !entry.title.trim().is_empty(),
        "Entry {} has empty title",
        entry.id
    );

    if entry.is_meeting() {
        debug_assert!(
            matches!(entry.sequence, Some(n) if n >= 1),
            "Meeting {} has sequence {:?}",
            entry.id,
            entry.sequence
        );

        debug_assert!(
            entry.end_date - entry.start_date == Duration::days(MEETING_WINDOW_DAYS - 1),
            "Meeting {} window is not {} days: {} to {}",
            entry.id,
            MEETING_WINDOW_DAYS,
            entry.start_date,
            entry.end_date
        );
    } else {
        debug_assert!(
            entry.sequence.is_none(),
            "Non-meeting entry {} carries sequence {:?}",
            entry.id,
            entry.sequence
        );
    }
}

/// Validate a meeting run ordered by sequence number: windows must be
/// contiguous and non-overlapping
pub fn assert_meeting_run_invariants(meetings: &[CalendarEntry]) {
    for entry in meetings {
        assert_entry_invariants(entry);
    }

    for pair in meetings.windows(2) {
        debug_assert!(
            pair[0].sequence < pair[1].sequence,
            "Meetings {} and {} are not ordered by sequence",
            pair[0].id,
            pair[1].id
        );

        debug_assert!(
            pair[1].start_date == pair[0].end_date + Duration::days(1),
            "Windows of {} and {} are not contiguous: {} then {}",
            pair[0].id,
            pair[1].id,
            pair[0].end_date,
            pair[1].start_date
        );
    }
}

/// Validate an attendance record before it is persisted
pub fn assert_record_invariants(record: &AttendanceRecord) {
    debug_assert!(
        !record.student_no.trim().is_empty(),
        "Attendance record for session {} has empty student number",
        record.session_id
    );

    debug_assert!(
        record.meeting_no >= 1,
        "Attendance record for {} has meeting number {}",
        record.student_no,
        record.meeting_no
    );

    // Auto-marked rows are always absences.
    debug_assert!(
        !record.auto_marked || record.status == AttendanceStatus::Absent,
        "Auto-marked record for {} has status {:?}",
        record.student_no,
        record.status
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn test_valid_meeting_run() {
        let meetings = crate::meetings::build_weekly_meetings(start(), 16).unwrap();
        assert_meeting_run_invariants(&meetings);
    }

    #[test]
    fn test_valid_other_entry() {
        let entry = CalendarEntry::other(
            "Final exams".into(),
            start(),
            start() + Duration::days(11),
        );
        assert_entry_invariants(&entry);
    }

    #[test]
    #[should_panic(expected = "not contiguous")]
    fn test_gap_between_windows_panics() {
        let mut meetings = crate::meetings::build_weekly_meetings(start(), 3).unwrap();
        meetings[2].start_date += Duration::days(1);
        meetings[2].end_date += Duration::days(1);
        assert_meeting_run_invariants(&meetings);
    }

    #[test]
    fn test_valid_record() {
        let record = AttendanceRecord::new(
            Uuid::new_v4(),
            "22001".into(),
            1,
            AttendanceStatus::Present,
            None,
        );
        assert_record_invariants(&record);
    }

    #[test]
    #[should_panic(expected = "meeting number")]
    fn test_zero_meeting_number_panics() {
        let record = AttendanceRecord::new(
            Uuid::new_v4(),
            "22001".into(),
            0,
            AttendanceStatus::Present,
            None,
        );
        assert_record_invariants(&record);
    }
}
