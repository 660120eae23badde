//! Account and login-session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role attached to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Lecturer,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lecturer => "lecturer",
            Role::Student => "student",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Lecturer => "Lecturer",
            Role::Student => "Student",
        }
    }

    /// Sort rank used by the account listing (admins first, students last)
    pub fn listing_rank(&self) -> u8 {
        match self {
            Role::Admin => 1,
            Role::Lecturer => 2,
            Role::Student => 3,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A registered account (admin, lecturer, or student)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Registry number: NIM for students, NIP for lecturers
    pub number: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Class label for students (e.g. "IH1"); None for staff
    pub class_label: Option<String>,
    /// Deactivated accounts cannot sign in
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(
        number: String,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            name,
            email: email.to_lowercase(),
            password_hash,
            role,
            class_label: None,
            active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    pub fn with_class(mut self, class_label: String) -> Self {
        self.class_label = Some(class_label.to_uppercase());
        self
    }
}

/// Active login session for an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: Uuid,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(account_id: Uuid, duration_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            created_at: now,
            expires_at: now + chrono::Duration::hours(duration_hours),
        }
    }

    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}
