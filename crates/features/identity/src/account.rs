//! Account rules that do not touch storage.

use crate::error::IdentityError;
use crate::model::User;
use chrono::{DateTime, Duration, Utc};

/// What a correct password means for an account in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Active account, log in normally.
    Active,
    /// Soft-deleted but still inside the grace period: reactivate, then log in.
    Restored,
    /// Soft-deleted and the grace period is over.
    Expired,
    /// Deactivated without a scheduled deletion.
    Inactive,
}

#[must_use]
pub fn login_outcome(user: &User, now: DateTime<Utc>) -> LoginOutcome {
    if user.is_active {
        return LoginOutcome::Active;
    }
    match user.scheduled_delete_at {
        Some(at) if now < at => LoginOutcome::Restored,
        Some(_) => LoginOutcome::Expired,
        None => LoginOutcome::Inactive,
    }
}

#[must_use]
pub fn deletion_deadline(now: DateTime<Utc>, grace_days: u32) -> DateTime<Utc> {
    now + Duration::days(i64::from(grace_days))
}

/// `@` + the local part of `email` + a three digit suffix.
#[must_use]
pub fn user_id_for(email: &str, suffix: u16) -> String {
    let local = email.split('@').next().unwrap_or_default();
    format!("@{local}{suffix}")
}

/// Uniform value in `100..=999` from the OS RNG.
pub fn random_suffix() -> Result<u16, IdentityError> {
    let mut buf = [0_u8; 2];
    getrandom::fill(&mut buf).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Generating user id".into()),
    })?;
    Ok(100 + u16::from_le_bytes(buf) % 900)
}
