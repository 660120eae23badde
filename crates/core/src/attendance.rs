//! Attendance auto-close evaluation
//!
//! Attendance defaults to Absent by omission: once a session's time window
//! lapses with nothing recorded, an auto-marked Absent row is written for the
//! student. Evaluation only happens when a dashboard reads the day's sessions,
//! so the write can land well after the session actually ended. Known lag
//! source, accepted.

use chrono::NaiveDateTime;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{minutes_of, AttendanceRecord, CalendarEntry, CourseSession};
use crate::storage::Database;

/// Where a moment sits relative to a session's daily time window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// Session has not started yet
    Before,
    /// Submission window is open (end minute inclusive)
    Open,
    /// Window has lapsed
    Lapsed,
}

pub fn window_phase(now_minutes: u32, start_minutes: u32, end_minutes: u32) -> WindowPhase {
    if now_minutes < start_minutes {
        WindowPhase::Before
    } else if now_minutes <= end_minutes {
        WindowPhase::Open
    } else {
        WindowPhase::Lapsed
    }
}

/// Outcome of evaluating one enrolled session for one student
#[derive(Debug, Clone)]
pub enum AttendanceOutcome {
    /// A record already exists and is shown as-is
    Recorded(AttendanceRecord),
    /// Window is open and nothing is recorded: submission form pending
    AwaitingInput { minutes_left: u32 },
    /// Window lapsed unanswered; the auto-marked Absent row was written
    AutoAbsent(AttendanceRecord),
    /// Session has not started yet today
    Upcoming,
}

/// Evaluate one session for `student_no` against `now` and the active
/// meeting, writing the Absent record if the window has lapsed unanswered.
///
/// Safe to re-run: the (session, student, meeting) key makes a repeated
/// lapsed evaluation overwrite the same row instead of duplicating it.
pub fn evaluate(
    db: &Database,
    now: NaiveDateTime,
    session: &CourseSession,
    student_no: &str,
    active: &CalendarEntry,
) -> Result<AttendanceOutcome> {
    let meeting_no = active
        .sequence
        .ok_or_else(|| Error::InvalidOperation("active calendar entry is not a meeting".into()))?;

    if let Some(existing) = db.attendance().find(session.id, student_no, meeting_no)? {
        return Ok(AttendanceOutcome::Recorded(existing));
    }

    let now_minutes = minutes_of(now.time());
    let end_minutes = session.end_minutes();

    match window_phase(now_minutes, session.start_minutes(), end_minutes) {
        WindowPhase::Before => Ok(AttendanceOutcome::Upcoming),
        WindowPhase::Open => Ok(AttendanceOutcome::AwaitingInput {
            minutes_left: end_minutes - now_minutes,
        }),
        WindowPhase::Lapsed => {
            let record = AttendanceRecord::auto_absent(
                session.id,
                student_no.to_string(),
                meeting_no,
                active.start_date,
            );
            db.attendance().upsert(&record)?;
            info!(
                course = %session.code,
                student = student_no,
                meeting = meeting_no,
                "window lapsed with no submission, auto-marked absent"
            );
            Ok(AttendanceOutcome::AutoAbsent(record))
        }
    }
}
