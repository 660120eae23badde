//! Student dashboard services
//!
//! Weekly schedule, course selection, today's attendance, and the
//! attendance card.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::info;
use uuid::Uuid;

use siakad_core::{
    attendance::{evaluate, window_phase, AttendanceOutcome, WindowPhase},
    minutes_of, AttendanceRecord, AttendanceStatus, CalendarEntry, CourseSession, Database,
    Enrollment, EnrollmentState, Error, Result, Role,
};

use crate::context::UserContext;

/// One row on the weekly schedule
#[derive(Debug, Clone)]
pub struct ScheduleRow {
    pub session: CourseSession,
    pub lecturer_name: Option<String>,
}

/// The calendar window covering `today`, for the schedule banner. Any kind
/// of entry qualifies; `None` simply means nothing is on.
pub fn calendar_banner(db: &Database, today: NaiveDate) -> Result<Option<CalendarEntry>> {
    db.calendar().find_active(today)
}

/// The student's weekly schedule: taken courses only, in day/time order,
/// with lecturer names resolved
pub fn my_schedule(db: &Database, ctx: &UserContext) -> Result<Vec<ScheduleRow>> {
    ctx.require_role(Role::Student)?;
    let class = ctx.require_class()?;

    let taken: HashSet<Uuid> = db
        .enrollments()
        .taken_session_ids(ctx.account_id)?
        .into_iter()
        .collect();

    let lecturers: HashMap<String, String> = db
        .accounts()
        .list_by_role(Role::Lecturer)?
        .into_iter()
        .map(|a| (a.number, a.name))
        .collect();

    let rows = db
        .courses()
        .list_for_class(class)?
        .into_iter()
        .filter(|s| taken.contains(&s.id))
        .map(|session| {
            let lecturer_name = lecturers.get(&session.lecturer_no).cloned();
            ScheduleRow {
                session,
                lecturer_name,
            }
        })
        .collect();

    Ok(rows)
}

/// Courses for the student's class they have neither taken nor declined
pub fn undecided_courses(db: &Database, ctx: &UserContext) -> Result<Vec<CourseSession>> {
    ctx.require_role(Role::Student)?;
    let class = ctx.require_class()?;

    let decided: HashSet<Uuid> = db
        .enrollments()
        .decisions_for_student(ctx.account_id)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    let sessions = db
        .courses()
        .list_for_class(class)?
        .into_iter()
        .filter(|s| !decided.contains(&s.id))
        .collect();

    Ok(sessions)
}

fn decide(
    db: &Database,
    ctx: &UserContext,
    session_id: Uuid,
    state: EnrollmentState,
) -> Result<()> {
    ctx.require_role(Role::Student)?;
    let class = ctx.require_class()?;

    let session = db
        .courses()
        .find_by_id(session_id)?
        .ok_or_else(|| Error::NotFound(format!("course session {session_id}")))?;

    if session.class_label != class {
        return Err(Error::InvalidOperation(format!(
            "course {} belongs to class {}",
            session.code, session.class_label
        )));
    }

    db.enrollments()
        .set(&Enrollment::new(session_id, ctx.account_id, state))?;

    info!(student = %ctx.number, course = %session.code, state = state.as_str(), "course decision recorded");
    Ok(())
}

/// Put a course on the student's schedule
pub fn take_course(db: &Database, ctx: &UserContext, session_id: Uuid) -> Result<()> {
    decide(db, ctx, session_id, EnrollmentState::Taken)
}

/// Hide a course from the pick list
pub fn decline_course(db: &Database, ctx: &UserContext, session_id: Uuid) -> Result<()> {
    decide(db, ctx, session_id, EnrollmentState::Declined)
}

/// One session's state on today's attendance page
#[derive(Debug)]
pub struct TodayAttendance {
    pub session: CourseSession,
    pub outcome: AttendanceOutcome,
}

/// What the attendance page shows
#[derive(Debug)]
pub struct AttendanceToday {
    /// None outside any meeting window: nothing to record, not an error
    pub active_meeting: Option<CalendarEntry>,
    pub sessions: Vec<TodayAttendance>,
}

/// Evaluate today's enrolled sessions against the active meeting, writing
/// auto-absences for windows that lapsed unanswered.
///
/// This runs only when the page is loaded, so an absence may be recorded
/// well after the session actually ended.
pub fn attendance_today(
    db: &Database,
    ctx: &UserContext,
    now: NaiveDateTime,
) -> Result<AttendanceToday> {
    ctx.require_role(Role::Student)?;
    let class = ctx.require_class()?;

    let Some(active) = db.calendar().find_active_meeting(now.date())? else {
        return Ok(AttendanceToday {
            active_meeting: None,
            sessions: Vec::new(),
        });
    };

    let taken: HashSet<Uuid> = db
        .enrollments()
        .taken_session_ids(ctx.account_id)?
        .into_iter()
        .collect();

    let todays: Vec<_> = db
        .courses()
        .list_for_class_on(class, now.date().weekday())?
        .into_iter()
        .filter(|s| taken.contains(&s.id))
        .collect();

    let mut sessions = Vec::with_capacity(todays.len());
    for session in todays {
        let outcome = evaluate(db, now, &session, &ctx.number, &active)?;
        sessions.push(TodayAttendance { session, outcome });
    }

    Ok(AttendanceToday {
        active_meeting: Some(active),
        sessions,
    })
}

/// Submit attendance for a session whose window is open right now
pub fn submit_attendance(
    db: &Database,
    ctx: &UserContext,
    now: NaiveDateTime,
    session_id: Uuid,
    status: AttendanceStatus,
    note: Option<String>,
) -> Result<AttendanceRecord> {
    ctx.require_role(Role::Student)?;

    let session = db
        .courses()
        .find_by_id(session_id)?
        .ok_or_else(|| Error::NotFound(format!("course session {session_id}")))?;

    match db.enrollments().get(session_id, ctx.account_id)? {
        Some(e) if e.state == EnrollmentState::Taken => {}
        _ => {
            return Err(Error::InvalidOperation(format!(
                "course {} is not on your schedule",
                session.code
            )))
        }
    }

    let active = db
        .calendar()
        .find_active_meeting(now.date())?
        .ok_or_else(|| Error::InvalidOperation("no active meeting today".into()))?;
    let meeting_no = active
        .sequence
        .ok_or_else(|| Error::InvalidOperation("active calendar entry is not a meeting".into()))?;

    match window_phase(
        minutes_of(now.time()),
        session.start_minutes(),
        session.end_minutes(),
    ) {
        WindowPhase::Open => {}
        WindowPhase::Before => {
            return Err(Error::InvalidOperation(format!(
                "session {} has not started yet",
                session.code
            )))
        }
        WindowPhase::Lapsed => {
            return Err(Error::InvalidOperation(format!(
                "submission window for {} has closed",
                session.code
            )))
        }
    }

    let record = AttendanceRecord::new(session.id, ctx.number.clone(), meeting_no, status, note)
        .with_meeting_date(active.start_date);
    db.attendance().upsert(&record)?;

    info!(student = %ctx.number, course = %session.code, meeting = meeting_no, status = %status, "attendance submitted");
    Ok(record)
}

/// One row on the attendance card
#[derive(Debug, Clone)]
pub struct CardRow {
    pub record: AttendanceRecord,
    /// Missing when the course was deleted after the record was written
    pub course: Option<CourseSession>,
}

/// The student's full attendance history, oldest meeting first
pub fn attendance_card(db: &Database, ctx: &UserContext) -> Result<Vec<CardRow>> {
    ctx.require_role(Role::Student)?;

    let records = db.attendance().list_for_student(&ctx.number)?;

    let mut courses: HashMap<Uuid, CourseSession> = HashMap::new();
    for record in &records {
        if let std::collections::hash_map::Entry::Vacant(slot) = courses.entry(record.session_id) {
            if let Some(course) = db.courses().find_by_id(record.session_id)? {
                slot.insert(course);
            }
        }
    }

    let rows = records
        .into_iter()
        .map(|record| {
            let course = courses.get(&record.session_id).cloned();
            CardRow { record, course }
        })
        .collect();

    Ok(rows)
}
