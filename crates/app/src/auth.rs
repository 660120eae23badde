//! Authentication service
//!
//! Password hashing and verification over stored accounts, plus session
//! creation and teardown. Identity only: role checks happen where the
//! services are called, via [`UserContext`].

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{info, warn};

use siakad_core::{AuthSession, Database, Error, Result};

use crate::context::UserContext;

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Authentication(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored)
        .map_err(|_| Error::Authentication("stored password hash is invalid".into()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| Error::Authentication("wrong password".into()))
}

/// Sign in with an email or a NIM/NIP, plus password. Deactivated accounts
/// are rejected before the password is even checked.
pub fn login(
    db: &Database,
    identifier: &str,
    password: &str,
    session_hours: i64,
) -> Result<UserContext> {
    let identifier = identifier.trim();

    let account = match db.accounts().find_by_email(identifier)? {
        Some(account) => Some(account),
        None => db.accounts().find_by_number(identifier)?,
    };

    let Some(account) = account else {
        warn!(identifier, "sign-in attempt for unknown account");
        return Err(Error::Authentication("account not found".into()));
    };

    if !account.active {
        return Err(Error::Authentication("account is deactivated".into()));
    }

    verify_password(password, &account.password_hash)?;

    db.accounts().update_last_login(account.id)?;

    let session = AuthSession::new(account.id, session_hours);
    db.accounts().create_session(&session)?;

    info!(number = %account.number, role = %account.role, "signed in");
    Ok(UserContext::from_account(&account, session.id))
}

/// Sign out: the session stops resolving immediately
pub fn logout(db: &Database, ctx: &UserContext) -> Result<()> {
    db.accounts().delete_session(ctx.session_id)?;
    info!(number = %ctx.number, "signed out");
    Ok(())
}
