//! Admin dashboard services
//!
//! Account management, the course timetable, and the academic calendar.
//! Every operation takes the caller's [`UserContext`] and refuses non-admin
//! roles.

use tracing::info;
use uuid::Uuid;

use siakad_core::{
    parse_clock, parse_day, Account, CalendarEntry, CourseSession, Database, Error, Result, Role,
};

use crate::auth;
use crate::context::UserContext;

/// Counts shown on the admin landing page
#[derive(Debug, Clone, Copy)]
pub struct DashboardSummary {
    pub students: u64,
    pub lecturers: u64,
    pub courses: u64,
    pub calendar_entries: u64,
}

pub fn dashboard_summary(db: &Database, ctx: &UserContext) -> Result<DashboardSummary> {
    ctx.require_role(Role::Admin)?;

    Ok(DashboardSummary {
        students: db.accounts().count_by_role(Role::Student)?,
        lecturers: db.accounts().count_by_role(Role::Lecturer)?,
        courses: db.courses().count()?,
        calendar_entries: db.calendar().count()?,
    })
}

// ---- accounts ----

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub number: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Only meaningful for students
    pub class_label: Option<String>,
}

pub fn create_account(db: &Database, ctx: &UserContext, input: NewAccount) -> Result<Account> {
    ctx.require_role(Role::Admin)?;

    let number = input.number.trim();
    if number.is_empty() {
        return Err(Error::InvalidOperation("registry number cannot be empty".into()));
    }

    if db.accounts().find_by_number(number)?.is_some() {
        return Err(Error::InvalidOperation(format!(
            "number {number} is already registered"
        )));
    }
    if db.accounts().find_by_email(&input.email)?.is_some() {
        return Err(Error::InvalidOperation(format!(
            "email {} is already registered",
            input.email
        )));
    }

    let password_hash = auth::hash_password(&input.password)?;
    let mut account = Account::new(
        number.to_string(),
        input.name.trim().to_string(),
        input.email,
        password_hash,
        input.role,
    );

    if input.role == Role::Student {
        if let Some(label) = input.class_label {
            account = account.with_class(label);
        }
    }

    db.accounts().create(&account)?;
    info!(number = %account.number, role = %account.role, "account created");
    Ok(account)
}

pub fn list_accounts(db: &Database, ctx: &UserContext) -> Result<Vec<Account>> {
    ctx.require_role(Role::Admin)?;
    db.accounts().list_all()
}

/// Activate or deactivate an account
pub fn set_account_active(
    db: &Database,
    ctx: &UserContext,
    account_id: Uuid,
    active: bool,
) -> Result<()> {
    ctx.require_role(Role::Admin)?;

    if db.accounts().find_by_id(account_id)?.is_none() {
        return Err(Error::NotFound(format!("account {account_id}")));
    }

    db.accounts().set_active(account_id, active)
}

/// Move a student to another class
pub fn reassign_class(
    db: &Database,
    ctx: &UserContext,
    account_id: Uuid,
    class_label: &str,
) -> Result<()> {
    ctx.require_role(Role::Admin)?;

    if class_label.trim().is_empty() {
        return Err(Error::InvalidOperation("class label cannot be empty".into()));
    }

    let account = db
        .accounts()
        .find_by_id(account_id)?
        .ok_or_else(|| Error::NotFound(format!("account {account_id}")))?;

    if account.role != Role::Student {
        return Err(Error::InvalidOperation(
            "only student accounts carry a class".into(),
        ));
    }

    db.accounts().update_class(account_id, class_label.trim())
}

// ---- timetable ----

/// Input for creating a course session; day and times arrive as form text
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: String,
    pub name: String,
    pub class_label: String,
    pub lecturer_no: String,
    pub day: String,
    pub starts: String,
    pub ends: Option<String>,
}

pub fn create_course(db: &Database, ctx: &UserContext, input: NewCourse) -> Result<CourseSession> {
    ctx.require_role(Role::Admin)?;

    let session = CourseSession::new(
        input.code,
        input.name.trim().to_string(),
        input.class_label,
        input.lecturer_no.trim().to_string(),
        parse_day(&input.day)?,
        parse_clock(&input.starts)?,
        input.ends.as_deref().map(parse_clock).transpose()?,
    );

    db.courses().create(&session)?;
    info!(code = %session.code, class = %session.class_label, "course created");
    Ok(session)
}

pub fn list_courses(db: &Database, ctx: &UserContext) -> Result<Vec<CourseSession>> {
    ctx.require_role(Role::Admin)?;
    db.courses().list_all()
}

/// Edit a course's time window from combined form text: either
/// `"08.00 - 09.40"` (start and end) or a bare start time.
pub fn edit_course_time(
    db: &Database,
    ctx: &UserContext,
    session_id: Uuid,
    time_input: &str,
) -> Result<CourseSession> {
    ctx.require_role(Role::Admin)?;

    let mut session = db
        .courses()
        .find_by_id(session_id)?
        .ok_or_else(|| Error::NotFound(format!("course session {session_id}")))?;

    let parts: Vec<&str> = time_input.split('-').collect();
    match parts.as_slice() {
        [start, end] => {
            session.starts = parse_clock(start)?;
            session.ends = Some(parse_clock(end)?);
        }
        [start] => {
            session.starts = parse_clock(start)?;
        }
        _ => {
            return Err(Error::InvalidDate(format!(
                "unparsable time window: {time_input}"
            )))
        }
    }

    db.courses().update(&session)?;
    Ok(session)
}

pub fn delete_course(db: &Database, ctx: &UserContext, session_id: Uuid) -> Result<()> {
    ctx.require_role(Role::Admin)?;

    if db.courses().find_by_id(session_id)?.is_none() {
        return Err(Error::NotFound(format!("course session {session_id}")));
    }

    db.courses().delete(session_id)
}

// ---- academic calendar ----

/// Write a run of weekly meetings. All-or-nothing; re-running with the same
/// range overwrites the previous run instead of duplicating it.
pub fn generate_meetings(
    db: &Database,
    ctx: &UserContext,
    start_date: &str,
    count: u32,
) -> Result<u32> {
    ctx.require_role(Role::Admin)?;

    let start = siakad_core::meetings::parse_date(start_date)?;
    db.calendar().generate_meetings(start, count)
}

/// Retitle and move one meeting; later meetings shift to keep weekly cadence
pub fn edit_meeting(
    db: &Database,
    ctx: &UserContext,
    meeting_id: &str,
    new_title: &str,
    new_start_date: &str,
) -> Result<()> {
    ctx.require_role(Role::Admin)?;
    db.calendar()
        .edit_meeting_and_shift(meeting_id, new_title, new_start_date)
}

/// Add an ad-hoc calendar entry (exam period, holiday)
pub fn add_calendar_entry(
    db: &Database,
    ctx: &UserContext,
    title: &str,
    start_date: &str,
    end_date: &str,
) -> Result<CalendarEntry> {
    ctx.require_role(Role::Admin)?;

    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidOperation("entry title cannot be empty".into()));
    }

    let start = siakad_core::meetings::parse_date(start_date)?;
    let end = siakad_core::meetings::parse_date(end_date)?;
    if end < start {
        return Err(Error::InvalidOperation(format!(
            "entry ends ({end}) before it starts ({start})"
        )));
    }

    let entry = CalendarEntry::other(title.to_string(), start, end);
    db.calendar().upsert(&entry)?;
    info!(entry = %entry.id, %title, "calendar entry added");
    Ok(entry)
}

pub fn delete_calendar_entry(db: &Database, ctx: &UserContext, entry_id: &str) -> Result<()> {
    ctx.require_role(Role::Admin)?;

    if db.calendar().find_by_id(entry_id)?.is_none() {
        return Err(Error::NotFound(format!("calendar entry {entry_id}")));
    }

    db.calendar().delete(entry_id)
}

pub fn list_calendar(db: &Database, ctx: &UserContext) -> Result<Vec<CalendarEntry>> {
    ctx.require_role(Role::Admin)?;
    db.calendar().list_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn admin_ctx(db: &Database) -> UserContext {
        let account = Account::new(
            "admin-1".into(),
            "Admin".into(),
            "admin@campus.test".into(),
            "hash".into(),
            Role::Admin,
        );
        db.accounts().create(&account).unwrap();
        UserContext::from_account(&account, Uuid::new_v4())
    }

    fn new_student(number: &str) -> NewAccount {
        NewAccount {
            number: number.into(),
            name: format!("Student {number}"),
            email: format!("{number}@campus.test"),
            password: "hunter2".into(),
            role: Role::Student,
            class_label: Some("ih1".into()),
        }
    }

    #[test]
    fn non_admin_callers_are_refused() {
        let db = Database::open_in_memory().unwrap();
        let admin = admin_ctx(&db);
        let student = create_account(&db, &admin, new_student("22001")).unwrap();
        let ctx = UserContext::from_account(&student, Uuid::new_v4());

        assert!(matches!(
            dashboard_summary(&db, &ctx),
            Err(Error::PermissionDenied(_))
        ));
        assert!(matches!(
            generate_meetings(&db, &ctx, "2025-09-01", 16),
            Err(Error::PermissionDenied(_))
        ));
    }

    #[test]
    fn duplicate_numbers_and_emails_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let ctx = admin_ctx(&db);

        create_account(&db, &ctx, new_student("22001")).unwrap();

        let err = create_account(&db, &ctx, new_student("22001")).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));

        let mut clashing_email = new_student("22002");
        clashing_email.email = "22001@campus.test".into();
        let err = create_account(&db, &ctx, clashing_email).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn class_reassignment_is_student_only() {
        let db = Database::open_in_memory().unwrap();
        let ctx = admin_ctx(&db);

        let lecturer = create_account(
            &db,
            &ctx,
            NewAccount {
                number: "198801".into(),
                name: "Lecturer".into(),
                email: "lecturer@campus.test".into(),
                password: "hunter2".into(),
                role: Role::Lecturer,
                class_label: None,
            },
        )
        .unwrap();

        let err = reassign_class(&db, &ctx, lecturer.id, "IH2").unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));

        let student = create_account(&db, &ctx, new_student("22003")).unwrap();
        reassign_class(&db, &ctx, student.id, "ih2").unwrap();
        let reloaded = db.accounts().find_by_id(student.id).unwrap().unwrap();
        assert_eq!(reloaded.class_label.as_deref(), Some("IH2"));
    }

    #[test]
    fn course_creation_parses_form_text() {
        let db = Database::open_in_memory().unwrap();
        let ctx = admin_ctx(&db);

        let course = create_course(
            &db,
            &ctx,
            NewCourse {
                code: "if101".into(),
                name: "Algorithms".into(),
                class_label: "ih1".into(),
                lecturer_no: "198801".into(),
                day: "wednesday".into(),
                starts: "08.00".into(),
                ends: Some("09.40".into()),
            },
        )
        .unwrap();

        assert_eq!(course.code, "IF101");
        assert_eq!(course.day, Weekday::Wed);
        assert_eq!(course.start_minutes(), 480);
        assert_eq!(course.end_minutes(), 580);
    }

    #[test]
    fn course_time_edit_accepts_combined_input() {
        let db = Database::open_in_memory().unwrap();
        let ctx = admin_ctx(&db);

        let course = create_course(
            &db,
            &ctx,
            NewCourse {
                code: "IF101".into(),
                name: "Algorithms".into(),
                class_label: "IH1".into(),
                lecturer_no: "198801".into(),
                day: "monday".into(),
                starts: "08.00".into(),
                ends: Some("09.40".into()),
            },
        )
        .unwrap();

        let edited = edit_course_time(&db, &ctx, course.id, "10.00 - 11.40").unwrap();
        assert_eq!(edited.start_minutes(), 600);
        assert_eq!(edited.end_minutes(), 700);

        let edited = edit_course_time(&db, &ctx, course.id, "13:00").unwrap();
        assert_eq!(edited.start_minutes(), 780);
        // A bare start keeps the previous end.
        assert_eq!(edited.end_minutes(), 700);
    }

    #[test]
    fn calendar_flow_generates_and_shifts() {
        let db = Database::open_in_memory().unwrap();
        let ctx = admin_ctx(&db);

        assert_eq!(generate_meetings(&db, &ctx, "2025-09-01", 16).unwrap(), 16);

        edit_meeting(&db, &ctx, "meeting_5", "Meeting 5", "2025-10-02").unwrap();
        let meetings = db.calendar().list_meetings().unwrap();
        assert_eq!(meetings[4].start_date.to_string(), "2025-10-02");
        assert_eq!(meetings[5].start_date.to_string(), "2025-10-09");

        let err = generate_meetings(&db, &ctx, "tomorrow", 16).unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
    }

    #[test]
    fn ad_hoc_entries_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let ctx = admin_ctx(&db);

        let entry =
            add_calendar_entry(&db, &ctx, "Final exams", "2025-12-01", "2025-12-12").unwrap();
        assert!(!entry.is_meeting());

        let err =
            add_calendar_entry(&db, &ctx, "Backwards", "2025-12-12", "2025-12-01").unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));

        delete_calendar_entry(&db, &ctx, &entry.id).unwrap();
        assert!(matches!(
            delete_calendar_entry(&db, &ctx, &entry.id),
            Err(Error::NotFound(_))
        ));
    }
}
