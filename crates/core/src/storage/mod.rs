//! SQLite storage layer for Siakad

mod accounts;
mod attendance;
mod calendar;
mod courses;
mod enrollments;
mod migrations;
mod parse;
mod traits;

use chrono::{NaiveDate, Weekday};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Account, AttendanceRecord, AuthSession, CalendarEntry, CourseSession, Enrollment,
    EnrollmentState, Role,
};
use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;

pub use accounts::AccountStore;
pub use attendance::AttendanceStore;
pub use calendar::CalendarStore;
pub use courses::CourseStore;
pub use enrollments::EnrollmentStore;
pub use traits::{
    AccountRepository, AttendanceRepository, CalendarRepository, CourseRepository, Storage,
};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get account store
    pub fn accounts(&self) -> AccountStore<'_> {
        AccountStore::new(&self.conn)
    }

    /// Get calendar store
    pub fn calendar(&self) -> CalendarStore<'_> {
        CalendarStore::new(&self.conn)
    }

    /// Get course session store
    pub fn courses(&self) -> CourseStore<'_> {
        CourseStore::new(&self.conn)
    }

    /// Get enrollment store
    pub fn enrollments(&self) -> EnrollmentStore<'_> {
        EnrollmentStore::new(&self.conn)
    }

    /// Get attendance store
    pub fn attendance(&self) -> AttendanceStore<'_> {
        AttendanceStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl AccountRepository for Database {
    fn create_account(&self, account: &Account) -> Result<()> {
        self.accounts().create(account)
    }

    fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.accounts().find_by_id(id)
    }

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>> {
        self.accounts().find_by_number(number)
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.accounts().find_by_email(email)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.accounts().list_all()
    }

    fn list_students_in_class(&self, class_label: &str) -> Result<Vec<Account>> {
        self.accounts().list_students_in_class(class_label)
    }

    fn count_accounts_by_role(&self, role: Role) -> Result<u64> {
        self.accounts().count_by_role(role)
    }

    fn set_account_active(&self, account_id: Uuid, active: bool) -> Result<()> {
        self.accounts().set_active(account_id, active)
    }

    fn update_account_class(&self, account_id: Uuid, class_label: &str) -> Result<()> {
        self.accounts().update_class(account_id, class_label)
    }

    fn update_last_login(&self, account_id: Uuid) -> Result<()> {
        self.accounts().update_last_login(account_id)
    }

    fn create_session(&self, session: &AuthSession) -> Result<()> {
        self.accounts().create_session(session)
    }

    fn find_valid_session(&self, session_id: Uuid) -> Result<Option<AuthSession>> {
        self.accounts().find_valid_session(session_id)
    }

    fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.accounts().delete_session(session_id)
    }

    fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.accounts().cleanup_expired_sessions()
    }
}

impl CalendarRepository for Database {
    fn upsert_entry(&self, entry: &CalendarEntry) -> Result<()> {
        self.calendar().upsert(entry)
    }

    fn find_entry(&self, id: &str) -> Result<Option<CalendarEntry>> {
        self.calendar().find_by_id(id)
    }

    fn find_meeting(&self, sequence: u32) -> Result<Option<CalendarEntry>> {
        self.calendar().find_meeting(sequence)
    }

    fn list_entries(&self) -> Result<Vec<CalendarEntry>> {
        self.calendar().list_all()
    }

    fn list_meetings(&self) -> Result<Vec<CalendarEntry>> {
        self.calendar().list_meetings()
    }

    fn delete_entry(&self, id: &str) -> Result<()> {
        self.calendar().delete(id)
    }

    fn generate_meetings(&self, start_date: NaiveDate, count: u32) -> Result<u32> {
        self.calendar().generate_meetings(start_date, count)
    }

    fn find_active_meeting(&self, today: NaiveDate) -> Result<Option<CalendarEntry>> {
        self.calendar().find_active_meeting(today)
    }

    fn edit_meeting_and_shift(
        &self,
        meeting_id: &str,
        new_title: &str,
        new_start_date: &str,
    ) -> Result<()> {
        self.calendar()
            .edit_meeting_and_shift(meeting_id, new_title, new_start_date)
    }
}

impl CourseRepository for Database {
    fn create_course(&self, session: &CourseSession) -> Result<()> {
        self.courses().create(session)
    }

    fn find_course(&self, id: Uuid) -> Result<Option<CourseSession>> {
        self.courses().find_by_id(id)
    }

    fn list_courses(&self) -> Result<Vec<CourseSession>> {
        self.courses().list_all()
    }

    fn list_courses_for_class(&self, class_label: &str) -> Result<Vec<CourseSession>> {
        self.courses().list_for_class(class_label)
    }

    fn list_courses_for_class_on(
        &self,
        class_label: &str,
        day: Weekday,
    ) -> Result<Vec<CourseSession>> {
        self.courses().list_for_class_on(class_label, day)
    }

    fn list_courses_for_lecturer(&self, lecturer_no: &str) -> Result<Vec<CourseSession>> {
        self.courses().list_for_lecturer(lecturer_no)
    }

    fn update_course(&self, session: &CourseSession) -> Result<()> {
        self.courses().update(session)
    }

    fn delete_course(&self, id: Uuid) -> Result<()> {
        self.courses().delete(id)
    }

    fn set_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
        self.enrollments().set(enrollment)
    }

    fn get_enrollment(&self, session_id: Uuid, student_id: Uuid) -> Result<Option<Enrollment>> {
        self.enrollments().get(session_id, student_id)
    }

    fn enrollment_decisions(&self, student_id: Uuid) -> Result<Vec<(Uuid, EnrollmentState)>> {
        self.enrollments().decisions_for_student(student_id)
    }

    fn taken_session_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>> {
        self.enrollments().taken_session_ids(student_id)
    }

    fn taken_student_ids(&self, session_id: Uuid) -> Result<Vec<Uuid>> {
        self.enrollments().taken_student_ids(session_id)
    }
}

impl AttendanceRepository for Database {
    fn upsert_record(&self, record: &AttendanceRecord) -> Result<()> {
        self.attendance().upsert(record)
    }

    fn upsert_records(&self, records: &[AttendanceRecord]) -> Result<()> {
        self.attendance().upsert_many(records)
    }

    fn find_record(
        &self,
        session_id: Uuid,
        student_no: &str,
        meeting_no: u32,
    ) -> Result<Option<AttendanceRecord>> {
        self.attendance().find(session_id, student_no, meeting_no)
    }

    fn records_for_session(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        self.attendance().list_for_session(session_id)
    }

    fn records_for_student(&self, student_no: &str) -> Result<Vec<AttendanceRecord>> {
        self.attendance().list_for_student(student_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_open_on_disk_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siakad.db");

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version(), 2);
        db.calendar()
            .generate_meetings(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), 4)
            .unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version(), 2);
        assert_eq!(db.calendar().list_meetings().unwrap().len(), 4);
    }
}
