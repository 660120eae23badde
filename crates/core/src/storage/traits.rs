//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend).

use chrono::{NaiveDate, Weekday};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Account, AttendanceRecord, AuthSession, CalendarEntry, CourseSession, Enrollment,
    EnrollmentState, Role,
};

/// Account and login-session repository operations
pub trait AccountRepository {
    /// Create a new account
    fn create_account(&self, account: &Account) -> Result<()>;

    /// Find account by ID
    fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Find account by NIM/NIP
    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>>;

    /// Find account by email
    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// List every account
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// List students assigned to a class
    fn list_students_in_class(&self, class_label: &str) -> Result<Vec<Account>>;

    /// Count accounts with a given role
    fn count_accounts_by_role(&self, role: Role) -> Result<u64>;

    /// Activate or deactivate an account
    fn set_account_active(&self, account_id: Uuid, active: bool) -> Result<()>;

    /// Reassign a student's class
    fn update_account_class(&self, account_id: Uuid, class_label: &str) -> Result<()>;

    /// Update an account's last login time
    fn update_last_login(&self, account_id: Uuid) -> Result<()>;

    /// Create a login session
    fn create_session(&self, session: &AuthSession) -> Result<()>;

    /// Find a valid (non-expired) session
    fn find_valid_session(&self, session_id: Uuid) -> Result<Option<AuthSession>>;

    /// Delete a session
    fn delete_session(&self, session_id: Uuid) -> Result<()>;

    /// Clean up expired sessions
    fn cleanup_expired_sessions(&self) -> Result<u64>;
}

/// Academic calendar repository operations
pub trait CalendarRepository {
    /// Insert or overwrite one entry
    fn upsert_entry(&self, entry: &CalendarEntry) -> Result<()>;

    /// Find entry by ID
    fn find_entry(&self, id: &str) -> Result<Option<CalendarEntry>>;

    /// Find the meeting with a given sequence number
    fn find_meeting(&self, sequence: u32) -> Result<Option<CalendarEntry>>;

    /// List the whole calendar
    fn list_entries(&self) -> Result<Vec<CalendarEntry>>;

    /// List every meeting ordered by sequence
    fn list_meetings(&self) -> Result<Vec<CalendarEntry>>;

    /// Delete an entry
    fn delete_entry(&self, id: &str) -> Result<()>;

    /// Write a run of weekly meetings as one atomic batch
    fn generate_meetings(&self, start_date: NaiveDate, count: u32) -> Result<u32>;

    /// The entry whose window contains `today`, if any
    fn find_active_meeting(&self, today: NaiveDate) -> Result<Option<CalendarEntry>>;

    /// Move a meeting and rebase every later meeting atomically
    fn edit_meeting_and_shift(
        &self,
        meeting_id: &str,
        new_title: &str,
        new_start_date: &str,
    ) -> Result<()>;
}

/// Course session and enrollment repository operations
pub trait CourseRepository {
    /// Create a new course session
    fn create_course(&self, session: &CourseSession) -> Result<()>;

    /// Find course session by ID
    fn find_course(&self, id: Uuid) -> Result<Option<CourseSession>>;

    /// List every course session
    fn list_courses(&self) -> Result<Vec<CourseSession>>;

    /// Course sessions for one class
    fn list_courses_for_class(&self, class_label: &str) -> Result<Vec<CourseSession>>;

    /// Course sessions for one class on one weekday
    fn list_courses_for_class_on(
        &self,
        class_label: &str,
        day: Weekday,
    ) -> Result<Vec<CourseSession>>;

    /// Course sessions taught by one lecturer
    fn list_courses_for_lecturer(&self, lecturer_no: &str) -> Result<Vec<CourseSession>>;

    /// Overwrite a course session
    fn update_course(&self, session: &CourseSession) -> Result<()>;

    /// Delete a course session
    fn delete_course(&self, id: Uuid) -> Result<()>;

    /// Record a student's decision about a course
    fn set_enrollment(&self, enrollment: &Enrollment) -> Result<()>;

    /// Get a student's decision for one course
    fn get_enrollment(&self, session_id: Uuid, student_id: Uuid) -> Result<Option<Enrollment>>;

    /// Every decision a student has made
    fn enrollment_decisions(&self, student_id: Uuid) -> Result<Vec<(Uuid, EnrollmentState)>>;

    /// Sessions a student has taken
    fn taken_session_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>>;

    /// Students who have taken a session
    fn taken_student_ids(&self, session_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Attendance repository operations
pub trait AttendanceRepository {
    /// Write one record, overwriting any previous row for the same triple
    fn upsert_record(&self, record: &AttendanceRecord) -> Result<()>;

    /// Write a batch of records atomically
    fn upsert_records(&self, records: &[AttendanceRecord]) -> Result<()>;

    /// Find the record for one (session, student, meeting) triple
    fn find_record(
        &self,
        session_id: Uuid,
        student_no: &str,
        meeting_no: u32,
    ) -> Result<Option<AttendanceRecord>>;

    /// Every record for one course session
    fn records_for_session(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>>;

    /// A student's full history
    fn records_for_student(&self, student_no: &str) -> Result<Vec<AttendanceRecord>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or network.
pub trait Storage:
    AccountRepository + CalendarRepository + CourseRepository + AttendanceRepository
{
}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: AccountRepository + CalendarRepository + CourseRepository + AttendanceRepository
{
}
