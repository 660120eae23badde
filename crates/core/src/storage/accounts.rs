//! Account and login-session storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    parse_datetime, parse_datetime_opt, parse_uuid, role_from_str, OptionalExt,
};
use crate::error::Result;
use crate::models::{Account, AuthSession, Role};

pub struct AccountStore<'a> {
    conn: &'a Connection,
}

const ACCOUNT_COLUMNS: &str =
    "id, number, name, email, password_hash, role, class_label, active, created_at, last_login";

fn read_account(row: &Row<'_>) -> std::result::Result<Account, rusqlite::Error> {
    Ok(Account {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        number: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        role: role_from_str(&row.get::<_, String>(5)?),
        class_label: row.get(6)?,
        active: row.get::<_, i32>(7)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
        last_login: parse_datetime_opt(row.get::<_, Option<String>>(9)?)?,
    })
}

impl<'a> AccountStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new account
    #[instrument(skip(self, account), fields(number = %account.number, role = %account.role))]
    pub fn create(&self, account: &Account) -> Result<()> {
        self.conn.execute(
            "INSERT INTO accounts (id, number, name, email, password_hash, role, class_label, active, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                account.id.to_string(),
                account.number,
                account.name,
                account.email,
                account.password_hash,
                account.role.as_str(),
                account.class_label,
                account.active as i32,
                account.created_at.to_rfc3339(),
                account.last_login.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Find account by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"
        ))?;

        let account = stmt
            .query_row(params![id.to_string()], read_account)
            .optional()?;

        Ok(account)
    }

    /// Find account by NIM/NIP
    #[instrument(skip(self))]
    pub fn find_by_number(&self, number: &str) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE number = ?1"
        ))?;

        let account = stmt.query_row(params![number], read_account).optional()?;

        Ok(account)
    }

    /// Find account by email
    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"
        ))?;

        let account = stmt
            .query_row(params![email.to_lowercase()], read_account)
            .optional()?;

        Ok(account)
    }

    /// List every account, admins first, then by email
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY role, email"
        ))?;

        let accounts = stmt
            .query_map([], read_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// List accounts with a given role
    #[instrument(skip(self))]
    pub fn list_by_role(&self, role: Role) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE role = ?1 ORDER BY number"
        ))?;

        let accounts = stmt
            .query_map(params![role.as_str()], read_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// List students assigned to a class
    #[instrument(skip(self))]
    pub fn list_students_in_class(&self, class_label: &str) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE role = 'student' AND class_label = ?1
             ORDER BY name"
        ))?;

        let accounts = stmt
            .query_map(params![class_label.to_uppercase()], read_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Count accounts with a given role
    pub fn count_by_role(&self, role: Role) -> Result<u64> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE role = ?1",
            params![role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Activate or deactivate an account
    #[instrument(skip(self))]
    pub fn set_active(&self, account_id: Uuid, active: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET active = ?1 WHERE id = ?2",
            params![active as i32, account_id.to_string()],
        )?;
        Ok(())
    }

    /// Reassign a student's class label
    #[instrument(skip(self))]
    pub fn update_class(&self, account_id: Uuid, class_label: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET class_label = ?1 WHERE id = ?2",
            params![class_label.to_uppercase(), account_id.to_string()],
        )?;
        Ok(())
    }

    /// Update last login time
    pub fn update_last_login(&self, account_id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET last_login = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), account_id.to_string()],
        )?;
        Ok(())
    }

    /// Create a login session
    #[instrument(skip(self, session), fields(account_id = %session.account_id))]
    pub fn create_session(&self, session: &AuthSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO auth_sessions (id, account_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.to_string(),
                session.account_id.to_string(),
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find a valid (non-expired) session
    #[instrument(skip(self))]
    pub fn find_valid_session(&self, session_id: Uuid) -> Result<Option<AuthSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, created_at, expires_at FROM auth_sessions
             WHERE id = ?1 AND expires_at > ?2",
        )?;

        let now = Utc::now().to_rfc3339();
        let session = stmt
            .query_row(params![session_id.to_string(), now], |row| {
                Ok(AuthSession {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    account_id: parse_uuid(&row.get::<_, String>(1)?)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?)?,
                    expires_at: parse_datetime(&row.get::<_, String>(3)?)?,
                })
            })
            .optional()?;

        Ok(session)
    }

    /// Delete a session
    #[instrument(skip(self))]
    pub fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM auth_sessions WHERE id = ?1",
            params![session_id.to_string()],
        )?;
        Ok(())
    }

    /// Clean up expired sessions, returning how many were removed
    pub fn cleanup_expired_sessions(&self) -> Result<u64> {
        let removed = self.conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at <= ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(removed as u64)
    }
}
