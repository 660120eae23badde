//! Lecturer dashboard services
//!
//! Taught-course listing, the per-course attendance sheet, and bulk
//! corrections.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use siakad_core::{
    meetings, Account, AttendanceRecord, AttendanceStatus, CourseSession, Database, Error, Result,
    Role,
};

use crate::context::UserContext;

/// Courses taught by the signed-in lecturer, in day/time order
pub fn my_courses(db: &Database, ctx: &UserContext) -> Result<Vec<CourseSession>> {
    ctx.require_role(Role::Lecturer)?;
    db.courses().list_for_lecturer(&ctx.number)
}

fn owned_course(db: &Database, ctx: &UserContext, session_id: Uuid) -> Result<CourseSession> {
    let course = db
        .courses()
        .find_by_id(session_id)?
        .ok_or_else(|| Error::NotFound(format!("course session {session_id}")))?;

    if course.lecturer_no != ctx.number {
        return Err(Error::PermissionDenied(format!(
            "course {} is taught by someone else",
            course.code
        )));
    }

    Ok(course)
}

/// Per-student status tallies across the sheet
#[derive(Debug, Clone, Copy, Default)]
pub struct Tally {
    pub present: u32,
    pub excused: u32,
    pub sick: u32,
    pub absent: u32,
}

impl Tally {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::ExcusedLeave => self.excused += 1,
            AttendanceStatus::Sick => self.sick += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }
}

/// Column header: one meeting, with the date the course runs that week
#[derive(Debug, Clone)]
pub struct SheetColumn {
    pub meeting_no: u32,
    /// The course's weekday resolved inside the meeting window
    pub date: NaiveDate,
    /// Whether this is the currently active meeting
    pub active: bool,
}

/// One student's row: their marks keyed by meeting number, plus tallies
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub student: Account,
    pub marks: BTreeMap<u32, AttendanceRecord>,
    pub tally: Tally,
}

/// The whole attendance grid for one course
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    pub course: CourseSession,
    pub columns: Vec<SheetColumn>,
    pub rows: Vec<SheetRow>,
}

/// Build the attendance grid: every student who took the course, against
/// every meeting on the calendar
pub fn attendance_sheet(
    db: &Database,
    ctx: &UserContext,
    session_id: Uuid,
    today: NaiveDate,
) -> Result<AttendanceSheet> {
    ctx.require_role(Role::Lecturer)?;
    let course = owned_course(db, ctx, session_id)?;

    let meetings_list = db.calendar().list_meetings()?;
    let active_no = db
        .calendar()
        .find_active_meeting(today)?
        .and_then(|e| e.sequence);

    let columns = meetings_list
        .iter()
        .map(|m| SheetColumn {
            meeting_no: m.sequence.unwrap_or_default(),
            date: meetings::lecture_date(m, course.day),
            active: m.sequence.is_some() && m.sequence == active_no,
        })
        .collect();

    let mut by_student: HashMap<String, BTreeMap<u32, AttendanceRecord>> = HashMap::new();
    for record in db.attendance().list_for_session(session_id)? {
        by_student
            .entry(record.student_no.clone())
            .or_default()
            .insert(record.meeting_no, record);
    }

    let taken: HashSet<Uuid> = db
        .enrollments()
        .taken_student_ids(session_id)?
        .into_iter()
        .collect();

    let rows = db
        .accounts()
        .list_students_in_class(&course.class_label)?
        .into_iter()
        .filter(|a| taken.contains(&a.id))
        .map(|student| {
            let marks = by_student.remove(&student.number).unwrap_or_default();
            let mut tally = Tally::default();
            for record in marks.values() {
                tally.add(record.status);
            }
            SheetRow {
                student,
                marks,
                tally,
            }
        })
        .collect();

    Ok(AttendanceSheet {
        course,
        columns,
        rows,
    })
}

/// One cell edit in a sheet save
#[derive(Debug, Clone)]
pub struct SheetMark {
    pub student_no: String,
    pub meeting_no: u32,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

/// Save lecturer corrections as one atomic batch. Each mark overwrites
/// whatever the triple held before, auto-absences included.
pub fn save_sheet(
    db: &Database,
    ctx: &UserContext,
    session_id: Uuid,
    marks: &[SheetMark],
) -> Result<u32> {
    ctx.require_role(Role::Lecturer)?;
    let course = owned_course(db, ctx, session_id)?;

    let dates: HashMap<u32, NaiveDate> = db
        .calendar()
        .list_meetings()?
        .into_iter()
        .filter_map(|m| m.sequence.map(|n| (n, m.start_date)))
        .collect();

    let records: Vec<AttendanceRecord> = marks
        .iter()
        .map(|mark| {
            let mut record = AttendanceRecord::new(
                session_id,
                mark.student_no.clone(),
                mark.meeting_no,
                mark.status,
                mark.note.clone(),
            );
            if let Some(date) = dates.get(&mark.meeting_no) {
                record = record.with_meeting_date(*date);
            }
            record
        })
        .collect();

    db.attendance().upsert_many(&records)?;

    info!(course = %course.code, marks = records.len(), "attendance sheet saved");
    Ok(records.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use siakad_core::{parse_clock, Enrollment, EnrollmentState};

    struct Fixture {
        db: Database,
        ctx: UserContext,
        session: CourseSession,
        students: Vec<Account>,
    }

    /// A lecturer with one Wednesday course in IH1, two enrolled students,
    /// and a 16-meeting calendar starting Monday 2025-09-01.
    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();

        let lecturer = Account::new(
            "198801".into(),
            "Lecturer".into(),
            "lecturer@campus.test".into(),
            "hash".into(),
            Role::Lecturer,
        );
        db.accounts().create(&lecturer).unwrap();
        let ctx = UserContext::from_account(&lecturer, Uuid::new_v4());

        let session = CourseSession::new(
            "IF101".into(),
            "Algorithms".into(),
            "IH1".into(),
            "198801".into(),
            Weekday::Wed,
            parse_clock("08:00").unwrap(),
            Some(parse_clock("09:40").unwrap()),
        );
        db.courses().create(&session).unwrap();

        db.calendar()
            .generate_meetings(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), 16)
            .unwrap();

        let mut students = Vec::new();
        for number in ["22001", "22002"] {
            let student = Account::new(
                number.into(),
                format!("Student {number}"),
                format!("{number}@campus.test"),
                "hash".into(),
                Role::Student,
            )
            .with_class("IH1".into());
            db.accounts().create(&student).unwrap();
            db.enrollments()
                .set(&Enrollment::new(session.id, student.id, EnrollmentState::Taken))
                .unwrap();
            students.push(student);
        }

        Fixture {
            db,
            ctx,
            session,
            students,
        }
    }

    #[test]
    fn sheet_covers_students_and_meetings() {
        let f = fixture();

        db_marks(&f);

        let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let sheet = attendance_sheet(&f.db, &f.ctx, f.session.id, today).unwrap();

        assert_eq!(sheet.columns.len(), 16);
        assert_eq!(sheet.rows.len(), 2);

        // Week 2 is active on 2025-09-10; the course runs Wednesdays,
        // so the column lands on 2025-09-10 itself.
        let week2 = &sheet.columns[1];
        assert_eq!(week2.meeting_no, 2);
        assert!(week2.active);
        assert_eq!(week2.date, today);
        assert!(!sheet.columns[0].active);

        let row = sheet
            .rows
            .iter()
            .find(|r| r.student.number == "22001")
            .unwrap();
        assert_eq!(row.tally.present, 1);
        assert_eq!(row.tally.sick, 1);
        assert_eq!(row.tally.absent, 0);
        assert_eq!(row.marks.len(), 2);
    }

    fn db_marks(f: &Fixture) {
        save_sheet(
            &f.db,
            &f.ctx,
            f.session.id,
            &[
                SheetMark {
                    student_no: "22001".into(),
                    meeting_no: 1,
                    status: AttendanceStatus::Present,
                    note: None,
                },
                SheetMark {
                    student_no: "22001".into(),
                    meeting_no: 2,
                    status: AttendanceStatus::Sick,
                    note: Some("flu".into()),
                },
            ],
        )
        .unwrap();
    }

    #[test]
    fn corrections_overwrite_auto_marks() {
        let f = fixture();

        let auto = AttendanceRecord::auto_absent(
            f.session.id,
            "22002".into(),
            2,
            NaiveDate::from_ymd_opt(2025, 9, 8).unwrap(),
        );
        f.db.attendance().upsert(&auto).unwrap();

        save_sheet(
            &f.db,
            &f.ctx,
            f.session.id,
            &[SheetMark {
                student_no: "22002".into(),
                meeting_no: 2,
                status: AttendanceStatus::ExcusedLeave,
                note: Some("family matter".into()),
            }],
        )
        .unwrap();

        let record = f
            .db
            .attendance()
            .find(f.session.id, "22002", 2)
            .unwrap()
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::ExcusedLeave);
        assert!(!record.auto_marked);
        assert_eq!(
            f.db.attendance()
                .list_for_session(f.session.id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn foreign_courses_are_off_limits() {
        let f = fixture();

        let other = CourseSession::new(
            "IF202".into(),
            "Compilers".into(),
            "IH1".into(),
            "198899".into(),
            Weekday::Thu,
            parse_clock("10:00").unwrap(),
            None,
        );
        f.db.courses().create(&other).unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let err = attendance_sheet(&f.db, &f.ctx, other.id, today).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        let student_ctx = UserContext::from_account(&f.students[0], Uuid::new_v4());
        let err = my_courses(&f.db, &student_ctx).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }
}
