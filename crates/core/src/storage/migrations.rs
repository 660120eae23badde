//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Accounts: admins, lecturers, students
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                -- NIM for students, NIP for lecturers
                number TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                class_label TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_login TEXT
            );

            -- Login sessions
            CREATE TABLE IF NOT EXISTS auth_sessions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
            );

            -- Academic calendar: weekly meetings and ad-hoc windows
            CREATE TABLE IF NOT EXISTS calendar (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                kind TEXT NOT NULL,
                -- Present only for meeting-kind entries
                sequence INTEGER UNIQUE
            );

            -- Course sessions (the weekly timetable)
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                class_label TEXT NOT NULL,
                lecturer_no TEXT NOT NULL,
                -- 0 = Monday .. 6 = Sunday
                day INTEGER NOT NULL,
                starts TEXT NOT NULL,
                ends TEXT
            );

            -- Course selections made by students
            CREATE TABLE IF NOT EXISTS enrollments (
                session_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                state TEXT NOT NULL,
                decided_at TEXT NOT NULL,
                PRIMARY KEY (session_id, student_id),
                FOREIGN KEY (session_id) REFERENCES courses(id) ON DELETE CASCADE,
                FOREIGN KEY (student_id) REFERENCES accounts(id) ON DELETE CASCADE
            );

            -- Attendance, keyed by the (session, student, meeting) triple
            CREATE TABLE IF NOT EXISTS attendance (
                session_id TEXT NOT NULL,
                student_no TEXT NOT NULL,
                meeting_no INTEGER NOT NULL,
                status TEXT NOT NULL,
                note TEXT,
                recorded_at TEXT NOT NULL,
                meeting_date TEXT,
                auto_marked INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (session_id, student_no, meeting_no),
                FOREIGN KEY (session_id) REFERENCES courses(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Session indexes
            CREATE INDEX IF NOT EXISTS idx_auth_sessions_account ON auth_sessions(account_id);
            CREATE INDEX IF NOT EXISTS idx_auth_sessions_expires ON auth_sessions(expires_at);

            -- Account indexes
            CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts(role);
            CREATE INDEX IF NOT EXISTS idx_accounts_role_class ON accounts(role, class_label);

            -- Calendar indexes: the locator scans by start date,
            -- the shifter walks meetings by sequence
            CREATE INDEX IF NOT EXISTS idx_calendar_start ON calendar(start_date);
            CREATE INDEX IF NOT EXISTS idx_calendar_kind_sequence ON calendar(kind, sequence);

            -- Course indexes
            CREATE INDEX IF NOT EXISTS idx_courses_class ON courses(class_label);
            CREATE INDEX IF NOT EXISTS idx_courses_class_day ON courses(class_label, day);
            CREATE INDEX IF NOT EXISTS idx_courses_lecturer ON courses(lecturer_no);

            -- Enrollment and attendance indexes
            CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id);
            CREATE INDEX IF NOT EXISTS idx_attendance_session ON attendance(session_id);
            CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_no);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Get the latest migration version (test helper)
    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run twice
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
