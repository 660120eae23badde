//! Course selection storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{enrollment_from_str, parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::{Enrollment, EnrollmentState};

pub struct EnrollmentStore<'a> {
    conn: &'a Connection,
}

impl<'a> EnrollmentStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a student's decision about a course. A later decision for the
    /// same pair overwrites the earlier one.
    #[instrument(skip(self, enrollment), fields(session_id = %enrollment.session_id, student_id = %enrollment.student_id))]
    pub fn set(&self, enrollment: &Enrollment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO enrollments (session_id, student_id, state, decided_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, student_id) DO UPDATE SET
                state = excluded.state,
                decided_at = excluded.decided_at",
            params![
                enrollment.session_id.to_string(),
                enrollment.student_id.to_string(),
                enrollment.state.as_str(),
                enrollment.decided_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a student's decision for one course, if any
    #[instrument(skip(self))]
    pub fn get(&self, session_id: Uuid, student_id: Uuid) -> Result<Option<Enrollment>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_id, state, decided_at FROM enrollments
             WHERE session_id = ?1 AND student_id = ?2",
        )?;

        let enrollment = stmt
            .query_row(
                params![session_id.to_string(), student_id.to_string()],
                |row| {
                    Ok(Enrollment {
                        session_id: parse_uuid(&row.get::<_, String>(0)?)?,
                        student_id: parse_uuid(&row.get::<_, String>(1)?)?,
                        state: enrollment_from_str(&row.get::<_, String>(2)?),
                        decided_at: parse_datetime(&row.get::<_, String>(3)?)?,
                    })
                },
            )
            .optional()?;

        Ok(enrollment)
    }

    /// Every decision a student has made, as (session, state) pairs
    #[instrument(skip(self))]
    pub fn decisions_for_student(&self, student_id: Uuid) -> Result<Vec<(Uuid, EnrollmentState)>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, state FROM enrollments WHERE student_id = ?1",
        )?;

        let decisions = stmt
            .query_map(params![student_id.to_string()], |row| {
                Ok((
                    parse_uuid(&row.get::<_, String>(0)?)?,
                    enrollment_from_str(&row.get::<_, String>(1)?),
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(decisions)
    }

    /// Sessions a student has taken
    #[instrument(skip(self))]
    pub fn taken_session_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id FROM enrollments WHERE student_id = ?1 AND state = 'taken'",
        )?;

        let ids = stmt
            .query_map(params![student_id.to_string()], |row| {
                parse_uuid(&row.get::<_, String>(0)?)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    /// Students who have taken a session
    #[instrument(skip(self))]
    pub fn taken_student_ids(&self, session_id: Uuid) -> Result<Vec<Uuid>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_id FROM enrollments WHERE session_id = ?1 AND state = 'taken'",
        )?;

        let ids = stmt
            .query_map(params![session_id.to_string()], |row| {
                parse_uuid(&row.get::<_, String>(0)?)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }
}
