//! Session context
//!
//! The signed-in identity, resolved once from a stored session and passed
//! explicitly into every service call. There is no process-wide current
//! user.

use uuid::Uuid;

use siakad_core::{Account, Database, Error, Result, Role};

/// Who is making the request
#[derive(Debug, Clone)]
pub struct UserContext {
    pub account_id: Uuid,
    pub session_id: Uuid,
    /// NIM for students, NIP for lecturers
    pub number: String,
    pub name: String,
    pub role: Role,
    pub class_label: Option<String>,
}

impl UserContext {
    pub fn from_account(account: &Account, session_id: Uuid) -> Self {
        Self {
            account_id: account.id,
            session_id,
            number: account.number.clone(),
            name: account.name.clone(),
            role: account.role,
            class_label: account.class_label.clone(),
        }
    }

    /// Resolve a stored session back into a context. Fails when the session
    /// is expired or unknown, or the account has since been deactivated.
    pub fn resolve(db: &Database, session_id: Uuid) -> Result<Self> {
        let session = db
            .accounts()
            .find_valid_session(session_id)?
            .ok_or_else(|| Error::Authentication("session expired or unknown".into()))?;

        let account = db
            .accounts()
            .find_by_id(session.account_id)?
            .ok_or_else(|| Error::Authentication("account no longer exists".into()))?;

        if !account.active {
            return Err(Error::Authentication("account is deactivated".into()));
        }

        Ok(Self::from_account(&account, session_id))
    }

    pub fn require_role(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "requires {} access",
                role.display_name()
            )))
        }
    }

    /// The class a student operation is scoped to
    pub fn require_class(&self) -> Result<&str> {
        self.class_label
            .as_deref()
            .ok_or_else(|| Error::InvalidOperation("account has no class assigned".into()))
    }
}
