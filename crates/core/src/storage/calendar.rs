//! Academic calendar storage operations
//!
//! Home of the meeting generator and shifter write paths. Both touch many
//! rows and commit as a single transaction, so a failure leaves the calendar
//! exactly as it was.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, Row};
use tracing::{info, instrument};

use super::parse::{kind_from_str, parse_date, OptionalExt};
use crate::error::{Error, Result};
use crate::invariants::assert_meeting_run_invariants;
use crate::meetings;
use crate::models::{CalendarEntry, MEETING_WINDOW_DAYS};

pub struct CalendarStore<'a> {
    conn: &'a Connection,
}

fn read_entry(row: &Row<'_>) -> std::result::Result<CalendarEntry, rusqlite::Error> {
    Ok(CalendarEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        start_date: parse_date(&row.get::<_, String>(2)?)?,
        end_date: parse_date(&row.get::<_, String>(3)?)?,
        kind: kind_from_str(&row.get::<_, String>(4)?),
        sequence: row.get(5)?,
    })
}

fn write_entry(conn: &Connection, entry: &CalendarEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO calendar (id, title, start_date, end_date, kind, sequence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            kind = excluded.kind,
            sequence = excluded.sequence",
        params![
            entry.id,
            entry.title,
            entry.start_date.to_string(),
            entry.end_date.to_string(),
            entry.kind.as_str(),
            entry.sequence,
        ],
    )?;
    Ok(())
}

impl<'a> CalendarStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or overwrite a single entry
    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    pub fn upsert(&self, entry: &CalendarEntry) -> Result<()> {
        write_entry(self.conn, entry)
    }

    /// Find entry by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: &str) -> Result<Option<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar WHERE id = ?1",
        )?;

        let entry = stmt.query_row(params![id], read_entry).optional()?;

        Ok(entry)
    }

    /// Find the meeting with a given sequence number
    #[instrument(skip(self))]
    pub fn find_meeting(&self, sequence: u32) -> Result<Option<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar WHERE kind = 'meeting' AND sequence = ?1",
        )?;

        let entry = stmt.query_row(params![sequence], read_entry).optional()?;

        Ok(entry)
    }

    /// List the whole calendar: meetings in order, then everything else
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar ORDER BY kind, sequence, start_date",
        )?;

        let entries = stmt
            .query_map([], read_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// List every meeting ordered by sequence number
    #[instrument(skip(self))]
    pub fn list_meetings(&self) -> Result<Vec<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar WHERE kind = 'meeting' ORDER BY sequence",
        )?;

        let entries = stmt
            .query_map([], read_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries already started by `today`, newest start first, bounded
    #[instrument(skip(self))]
    pub fn list_started_by(&self, today: NaiveDate, limit: usize) -> Result<Vec<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar WHERE start_date <= ?1
             ORDER BY start_date DESC LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![today.to_string(), limit as i64], read_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Meetings strictly after a sequence number, ascending
    #[instrument(skip(self))]
    pub fn meetings_after(&self, sequence: u32) -> Result<Vec<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar WHERE kind = 'meeting' AND sequence > ?1
             ORDER BY sequence",
        )?;

        let entries = stmt
            .query_map(params![sequence], read_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete an entry
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM calendar WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Number of calendar entries
    pub fn count(&self) -> Result<u64> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM calendar", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Write `count` weekly meeting windows starting at `start_date` as one
    /// atomic batch. Meeting identifiers are derived from sequence numbers,
    /// so re-running with the same range overwrites instead of duplicating.
    #[instrument(skip(self))]
    pub fn generate_meetings(&self, start_date: NaiveDate, count: u32) -> Result<u32> {
        let entries = meetings::build_weekly_meetings(start_date, count)?;
        assert_meeting_run_invariants(&entries);

        let tx = self.conn.unchecked_transaction()?;
        for entry in &entries {
            write_entry(&tx, entry)?;
        }
        tx.commit()?;

        info!(count, start = %start_date, "generated weekly meetings");
        Ok(entries.len() as u32)
    }

    /// The entry whose window contains `today`, if any. A gap is a valid
    /// non-result, not an error.
    #[instrument(skip(self))]
    pub fn find_active(&self, today: NaiveDate) -> Result<Option<CalendarEntry>> {
        let candidates = self.list_started_by(today, meetings::LOCATOR_CANDIDATES)?;
        Ok(meetings::active_entry(&candidates, today).cloned())
    }

    /// Like [`find_active`](Self::find_active), but considers meetings only.
    /// An exam period or holiday overlapping the week never shadows the
    /// meeting the attendance path needs.
    #[instrument(skip(self))]
    pub fn find_active_meeting(&self, today: NaiveDate) -> Result<Option<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_date, end_date, kind, sequence
             FROM calendar WHERE kind = 'meeting' AND start_date <= ?1
             ORDER BY start_date DESC LIMIT ?2",
        )?;

        let candidates = stmt
            .query_map(
                params![today.to_string(), meetings::LOCATOR_CANDIDATES as i64],
                read_entry,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(meetings::active_entry(&candidates, today).cloned())
    }

    /// Move one meeting to a new start date and rebase every later meeting
    /// so weekly cadence continues uninterrupted. The edited entry and all
    /// shifted entries commit together or not at all; earlier meetings and
    /// non-meeting entries are never touched.
    #[instrument(skip(self))]
    pub fn edit_meeting_and_shift(
        &self,
        meeting_id: &str,
        new_title: &str,
        new_start_date: &str,
    ) -> Result<()> {
        let new_start = meetings::parse_date(new_start_date)?;

        let title = new_title.trim();
        if title.is_empty() {
            return Err(Error::InvalidOperation("meeting title cannot be empty".into()));
        }

        let mut edited = self
            .find_by_id(meeting_id)?
            .filter(CalendarEntry::is_meeting)
            .ok_or_else(|| Error::NotFound(format!("meeting {meeting_id}")))?;

        let Some(sequence) = edited.sequence else {
            return Err(Error::NotFound(format!("meeting {meeting_id}")));
        };

        edited.title = title.to_string();
        edited.start_date = new_start;
        edited.end_date = new_start + Duration::days(MEETING_WINDOW_DAYS - 1);

        let mut following = self.meetings_after(sequence)?;
        meetings::rebase_following(new_start, &mut following);

        #[cfg(debug_assertions)]
        {
            let mut run = Vec::with_capacity(following.len() + 1);
            run.push(edited.clone());
            run.extend(following.iter().cloned());
            assert_meeting_run_invariants(&run);
        }

        let tx = self.conn.unchecked_transaction()?;
        write_entry(&tx, &edited)?;
        for entry in &following {
            write_entry(&tx, entry)?;
        }
        tx.commit()?;

        info!(
            meeting = meeting_id,
            shifted = following.len(),
            start = %new_start,
            "meeting moved, later meetings rebased"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn date(s: &str) -> NaiveDate {
        meetings::parse_date(s).unwrap()
    }

    #[test]
    fn test_generate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let start = date("2025-09-01");

        assert_eq!(db.calendar().generate_meetings(start, 16).unwrap(), 16);
        assert_eq!(db.calendar().generate_meetings(start, 16).unwrap(), 16);

        let meetings = db.calendar().list_meetings().unwrap();
        assert_eq!(meetings.len(), 16);
        for pair in meetings.windows(2) {
            assert_eq!(pair[1].start_date, pair[0].end_date + Duration::days(1));
        }
    }

    #[test]
    fn test_generate_rejects_bad_counts() {
        let db = Database::open_in_memory().unwrap();
        let start = date("2025-09-01");

        assert!(matches!(
            db.calendar().generate_meetings(start, 0),
            Err(Error::InvalidCount(0))
        ));
        assert!(matches!(
            db.calendar().generate_meetings(start, 21),
            Err(Error::InvalidCount(21))
        ));
        assert_eq!(db.calendar().count().unwrap(), 0);
    }

    #[test]
    fn test_active_meeting_lookup() {
        let db = Database::open_in_memory().unwrap();
        db.calendar()
            .generate_meetings(date("2025-09-01"), 16)
            .unwrap();

        let hit = db.calendar().find_active(date("2025-09-10")).unwrap().unwrap();
        assert_eq!(hit.sequence, Some(2));

        // Before the first meeting, and after the last one: gaps.
        assert!(db.calendar().find_active(date("2025-08-31")).unwrap().is_none());
        assert!(db.calendar().find_active(date("2026-01-05")).unwrap().is_none());
    }

    #[test]
    fn test_other_entry_does_not_shadow_active_meeting() {
        let db = Database::open_in_memory().unwrap();
        db.calendar()
            .generate_meetings(date("2025-09-01"), 4)
            .unwrap();
        let exam = CalendarEntry::other("Quiz week".into(), date("2025-09-09"), date("2025-09-10"));
        db.calendar().upsert(&exam).unwrap();

        // The generic lookup sees the most recently started window.
        let banner = db.calendar().find_active(date("2025-09-09")).unwrap().unwrap();
        assert_eq!(banner.id, exam.id);

        // The attendance path still resolves meeting 2.
        let meeting = db
            .calendar()
            .find_active_meeting(date("2025-09-09"))
            .unwrap()
            .unwrap();
        assert_eq!(meeting.sequence, Some(2));
    }

    #[test]
    fn test_shift_rebases_later_meetings_only() {
        let db = Database::open_in_memory().unwrap();
        db.calendar()
            .generate_meetings(date("2025-09-01"), 16)
            .unwrap();
        let before = db.calendar().list_meetings().unwrap();

        // Meeting 5 (starts 2025-09-29) moves forward by three days.
        db.calendar()
            .edit_meeting_and_shift("meeting_5", "Midterm review", "2025-10-02")
            .unwrap();

        let after = db.calendar().list_meetings().unwrap();
        assert_eq!(after.len(), 16);

        // Meetings 1-4 untouched.
        for i in 0..4 {
            assert_eq!(after[i].start_date, before[i].start_date);
            assert_eq!(after[i].end_date, before[i].end_date);
        }

        // The edited meeting moved and kept its sequence and new title.
        assert_eq!(after[4].start_date, date("2025-10-02"));
        assert_eq!(after[4].end_date, date("2025-10-08"));
        assert_eq!(after[4].sequence, Some(5));
        assert_eq!(after[4].title, "Midterm review");

        // Meetings 6-16 each start exactly seven days after the previous.
        for i in 5..16 {
            assert_eq!(
                after[i].start_date,
                after[i - 1].start_date + Duration::days(7)
            );
            assert_eq!(after[i].sequence, before[i].sequence);
        }
    }

    #[test]
    fn test_shift_unknown_meeting_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        db.calendar()
            .generate_meetings(date("2025-09-01"), 8)
            .unwrap();
        let before = db.calendar().list_meetings().unwrap();

        let err = db
            .calendar()
            .edit_meeting_and_shift("meeting_99", "Nope", "2025-10-02")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let after = db.calendar().list_meetings().unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.start_date, b.start_date);
            assert_eq!(a.title, b.title);
        }
    }

    #[test]
    fn test_shift_rejects_non_meeting_targets() {
        let db = Database::open_in_memory().unwrap();
        let exam = CalendarEntry::other("Final exams".into(), date("2025-12-01"), date("2025-12-12"));
        db.calendar().upsert(&exam).unwrap();

        let err = db
            .calendar()
            .edit_meeting_and_shift(&exam.id, "Moved exams", "2025-12-08")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_shift_rejects_unparsable_date() {
        let db = Database::open_in_memory().unwrap();
        db.calendar()
            .generate_meetings(date("2025-09-01"), 4)
            .unwrap();

        let err = db
            .calendar()
            .edit_meeting_and_shift("meeting_2", "Meeting 2", "next tuesday")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
    }

    #[test]
    fn test_shift_leaves_other_entries_alone() {
        let db = Database::open_in_memory().unwrap();
        db.calendar()
            .generate_meetings(date("2025-09-01"), 4)
            .unwrap();
        let holiday =
            CalendarEntry::other("National holiday".into(), date("2025-09-17"), date("2025-09-17"));
        db.calendar().upsert(&holiday).unwrap();

        db.calendar()
            .edit_meeting_and_shift("meeting_1", "Meeting 1", "2025-09-02")
            .unwrap();

        let reloaded = db.calendar().find_by_id(&holiday.id).unwrap().unwrap();
        assert_eq!(reloaded.start_date, date("2025-09-17"));
    }
}
