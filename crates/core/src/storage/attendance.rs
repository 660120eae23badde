//! Attendance record storage operations
//!
//! Rows are keyed by the (session, student, meeting) triple. Writes are
//! upserts: resubmission and repeated auto-close evaluation overwrite the
//! same row instead of duplicating it.

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_date_opt, parse_datetime, parse_uuid, status_from_str, OptionalExt};
use crate::error::Result;
use crate::invariants::assert_record_invariants;
use crate::models::AttendanceRecord;

pub struct AttendanceStore<'a> {
    conn: &'a Connection,
}

fn read_record(row: &Row<'_>) -> std::result::Result<AttendanceRecord, rusqlite::Error> {
    Ok(AttendanceRecord {
        session_id: parse_uuid(&row.get::<_, String>(0)?)?,
        student_no: row.get(1)?,
        meeting_no: row.get(2)?,
        status: status_from_str(&row.get::<_, String>(3)?),
        note: row.get(4)?,
        recorded_at: parse_datetime(&row.get::<_, String>(5)?)?,
        meeting_date: parse_date_opt(row.get::<_, Option<String>>(6)?)?,
        auto_marked: row.get::<_, i32>(7)? != 0,
    })
}

fn write_record(conn: &Connection, record: &AttendanceRecord) -> Result<()> {
    assert_record_invariants(record);

    conn.execute(
        "INSERT INTO attendance (session_id, student_no, meeting_no, status, note, recorded_at, meeting_date, auto_marked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(session_id, student_no, meeting_no) DO UPDATE SET
            status = excluded.status,
            note = excluded.note,
            recorded_at = excluded.recorded_at,
            meeting_date = excluded.meeting_date,
            auto_marked = excluded.auto_marked",
        params![
            record.session_id.to_string(),
            record.student_no,
            record.meeting_no,
            record.status.as_str(),
            record.note,
            record.recorded_at.to_rfc3339(),
            record.meeting_date.map(|d| d.to_string()),
            record.auto_marked as i32,
        ],
    )?;
    Ok(())
}

impl<'a> AttendanceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Write one record, overwriting any previous row for the same triple
    #[instrument(skip(self, record), fields(student = %record.student_no, meeting = record.meeting_no))]
    pub fn upsert(&self, record: &AttendanceRecord) -> Result<()> {
        write_record(self.conn, record)
    }

    /// Write a batch of records as one atomic transaction (sheet saves)
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn upsert_many(&self, records: &[AttendanceRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            write_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Find the record for one (session, student, meeting) triple
    #[instrument(skip(self))]
    pub fn find(
        &self,
        session_id: Uuid,
        student_no: &str,
        meeting_no: u32,
    ) -> Result<Option<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_no, meeting_no, status, note, recorded_at, meeting_date, auto_marked
             FROM attendance WHERE session_id = ?1 AND student_no = ?2 AND meeting_no = ?3",
        )?;

        let record = stmt
            .query_row(
                params![session_id.to_string(), student_no, meeting_no],
                read_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Every record for one course session
    #[instrument(skip(self))]
    pub fn list_for_session(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_no, meeting_no, status, note, recorded_at, meeting_date, auto_marked
             FROM attendance WHERE session_id = ?1 ORDER BY student_no, meeting_no",
        )?;

        let records = stmt
            .query_map(params![session_id.to_string()], read_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// A student's full history, ordered by meeting number
    #[instrument(skip(self))]
    pub fn list_for_student(&self, student_no: &str) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_no, meeting_no, status, note, recorded_at, meeting_date, auto_marked
             FROM attendance WHERE student_no = ?1 ORDER BY meeting_no",
        )?;

        let records = stmt
            .query_map(params![student_no], read_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_clock, AttendanceStatus, CourseSession};
    use crate::storage::Database;
    use chrono::Weekday;

    fn seed_session(db: &Database) -> Uuid {
        let session = CourseSession::new(
            "IF101".into(),
            "Algorithms".into(),
            "IH1".into(),
            "198801".into(),
            Weekday::Mon,
            parse_clock("08:00").unwrap(),
            Some(parse_clock("09:40").unwrap()),
        );
        db.courses().create(&session).unwrap();
        session.id
    }

    #[test]
    fn test_upsert_overwrites_same_triple() {
        let db = Database::open_in_memory().unwrap();
        let session_id = seed_session(&db);

        let first = AttendanceRecord::new(
            session_id,
            "22001".into(),
            3,
            AttendanceStatus::Absent,
            None,
        );
        db.attendance().upsert(&first).unwrap();

        // Correction for the same triple replaces, never duplicates.
        let corrected = AttendanceRecord::new(
            session_id,
            "22001".into(),
            3,
            AttendanceStatus::Sick,
            Some("hospitalized".into()),
        );
        db.attendance().upsert(&corrected).unwrap();

        let rows = db.attendance().list_for_session(session_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AttendanceStatus::Sick);
        assert_eq!(rows[0].note.as_deref(), Some("hospitalized"));
    }

    #[test]
    fn test_missing_triple_is_none() {
        let db = Database::open_in_memory().unwrap();
        let session_id = seed_session(&db);

        let found = db.attendance().find(session_id, "22001", 1).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_batch_write_is_atomic_per_call() {
        let db = Database::open_in_memory().unwrap();
        let session_id = seed_session(&db);

        let records: Vec<_> = (1..=4)
            .map(|meeting_no| {
                AttendanceRecord::new(
                    session_id,
                    "22001".into(),
                    meeting_no,
                    AttendanceStatus::Present,
                    None,
                )
            })
            .collect();
        db.attendance().upsert_many(&records).unwrap();

        let history = db.attendance().list_for_student("22001").unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(
            history.iter().map(|r| r.meeting_no).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }
}
