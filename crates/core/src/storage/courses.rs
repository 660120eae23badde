//! Course session storage operations

use chrono::Weekday;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{day_from_u8, parse_time, parse_time_opt, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::CourseSession;

pub struct CourseStore<'a> {
    conn: &'a Connection,
}

fn read_session(row: &Row<'_>) -> std::result::Result<CourseSession, rusqlite::Error> {
    Ok(CourseSession {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        code: row.get(1)?,
        name: row.get(2)?,
        class_label: row.get(3)?,
        lecturer_no: row.get(4)?,
        day: day_from_u8(row.get::<_, u8>(5)?),
        starts: parse_time(&row.get::<_, String>(6)?)?,
        ends: parse_time_opt(row.get::<_, Option<String>>(7)?)?,
    })
}

fn clock_string(t: chrono::NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

impl<'a> CourseStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new course session
    #[instrument(skip(self, session), fields(code = %session.code, class = %session.class_label))]
    pub fn create(&self, session: &CourseSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO courses (id, code, name, class_label, lecturer_no, day, starts, ends)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.id.to_string(),
                session.code,
                session.name,
                session.class_label,
                session.lecturer_no,
                session.day.num_days_from_monday() as u8,
                clock_string(session.starts),
                session.ends.map(clock_string),
            ],
        )?;
        Ok(())
    }

    /// Find course session by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<CourseSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, class_label, lecturer_no, day, starts, ends
             FROM courses WHERE id = ?1",
        )?;

        let session = stmt
            .query_row(params![id.to_string()], read_session)
            .optional()?;

        Ok(session)
    }

    /// List every course session, ordered by subject code
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<CourseSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, class_label, lecturer_no, day, starts, ends
             FROM courses ORDER BY code",
        )?;

        let sessions = stmt
            .query_map([], read_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Course sessions for one class
    #[instrument(skip(self))]
    pub fn list_for_class(&self, class_label: &str) -> Result<Vec<CourseSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, class_label, lecturer_no, day, starts, ends
             FROM courses WHERE class_label = ?1 ORDER BY day, starts",
        )?;

        let sessions = stmt
            .query_map(params![class_label.to_uppercase()], read_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Course sessions for one class on one weekday
    #[instrument(skip(self))]
    pub fn list_for_class_on(&self, class_label: &str, day: Weekday) -> Result<Vec<CourseSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, class_label, lecturer_no, day, starts, ends
             FROM courses WHERE class_label = ?1 AND day = ?2 ORDER BY starts",
        )?;

        let sessions = stmt
            .query_map(
                params![
                    class_label.to_uppercase(),
                    day.num_days_from_monday() as u8
                ],
                read_session,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Course sessions taught by one lecturer
    #[instrument(skip(self))]
    pub fn list_for_lecturer(&self, lecturer_no: &str) -> Result<Vec<CourseSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, class_label, lecturer_no, day, starts, ends
             FROM courses WHERE lecturer_no = ?1 ORDER BY day, starts",
        )?;

        let sessions = stmt
            .query_map(params![lecturer_no], read_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Overwrite a course session
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn update(&self, session: &CourseSession) -> Result<()> {
        self.conn.execute(
            "UPDATE courses SET code = ?1, name = ?2, class_label = ?3, lecturer_no = ?4,
                    day = ?5, starts = ?6, ends = ?7
             WHERE id = ?8",
            params![
                session.code,
                session.name,
                session.class_label,
                session.lecturer_no,
                session.day.num_days_from_monday() as u8,
                clock_string(session.starts),
                session.ends.map(clock_string),
                session.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Delete a course session
    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.conn
            .execute("DELETE FROM courses WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    /// Number of course sessions
    pub fn count(&self) -> Result<u64> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count)
    }
}
