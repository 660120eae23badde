//! Attendance records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Note written on auto-marked absences
pub const AUTO_ABSENT_NOTE: &str = "not submitted in time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    ExcusedLeave,
    Sick,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::ExcusedLeave => "excused",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::ExcusedLeave => "Excused Leave",
            AttendanceStatus::Sick => "Sick",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One row per (session, student, meeting). The triple is the identity:
/// resubmitting for the same triple overwrites, never duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: Uuid,
    /// Student NIM
    pub student_no: String,
    /// Meeting sequence number the record belongs to
    pub meeting_no: u32,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
    /// Start date of the meeting window at the time of writing
    pub meeting_date: Option<NaiveDate>,
    /// True when written by the auto-closer rather than a person
    pub auto_marked: bool,
}

impl AttendanceRecord {
    pub fn new(
        session_id: Uuid,
        student_no: String,
        meeting_no: u32,
        status: AttendanceStatus,
        note: Option<String>,
    ) -> Self {
        Self {
            session_id,
            student_no,
            meeting_no,
            status,
            note,
            recorded_at: Utc::now(),
            meeting_date: None,
            auto_marked: false,
        }
    }

    pub fn with_meeting_date(mut self, date: NaiveDate) -> Self {
        self.meeting_date = Some(date);
        self
    }

    /// The record the auto-closer writes once a session window has lapsed
    pub fn auto_absent(
        session_id: Uuid,
        student_no: String,
        meeting_no: u32,
        meeting_date: NaiveDate,
    ) -> Self {
        Self {
            session_id,
            student_no,
            meeting_no,
            status: AttendanceStatus::Absent,
            note: Some(AUTO_ABSENT_NOTE.to_string()),
            recorded_at: Utc::now(),
            meeting_date: Some(meeting_date),
            auto_marked: true,
        }
    }
}
