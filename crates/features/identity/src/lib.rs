//! Identity feature slice: accounts, session login, profiles, soft deletion and
//! the `/api/users` resource.
//!
//! Besides the router, the slice owns two lifecycle hooks the server calls:
//! [`bootstrap_admin`] on startup and [`spawn_purge_task`] for accounts whose
//! deletion grace period has run out.

pub mod account;
mod error;
mod handlers;
pub mod model;
pub mod repository;

pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::handlers::router;

use crate::model::NewUser;
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};
use vpms_database::Database;
use vpms_domain::config::{AdminConfig, ApiConfig};
use vpms_domain::registry::InitializedSlice;
use vpms_domain::types::UserRole;
use vpms_kernel::security::hash_password;

/// Identity settings shared with the handlers.
#[vpms_derive::vpms_slice]
pub struct Identity {
    /// Days a soft-deleted account can still be restored by logging in.
    pub deletion_grace_days: u32,
}

/// Initializes the identity slice.
///
/// # Errors
/// Returns [`IdentityError::Config`] when the grace period is zero.
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, IdentityError> {
    let grace = config.parking.deletion_grace_days;
    if grace == 0 {
        return Err(IdentityError::Config {
            message: "deletion_grace_days must be at least 1".into(),
            context: Some("parking.deletion_grace_days".into()),
        });
    }

    info!(deletion_grace_days = grace, "Identity feature initialized");
    Ok(InitializedSlice::new(Identity::new(IdentityInner { deletion_grace_days: grace })))
}

/// Creates the configured admin account when the database has no admin yet.
///
/// Returns `true` when an account was created.
///
/// # Errors
/// Fails on storage errors, hashing errors, or when the configured admin email is
/// already taken by a regular account.
pub async fn bootstrap_admin(database: &Database, admin: &AdminConfig) -> Result<bool, IdentityError> {
    let admin = admin.clone();
    let created = database
        .call(move |conn| {
            if repository::admin_exists(conn)? {
                return Ok(None);
            }
            if repository::email_exists(conn, &admin.email)? {
                return Err(IdentityError::Config {
                    message: format!("{} is already used by a regular account", admin.email).into(),
                    context: Some("security.admin.email".into()),
                });
            }

            let new_user = NewUser {
                id: admin.id,
                full_name: admin.full_name,
                email: admin.email,
                password_hash: hash_password(&admin.password)?,
                phone_number: Some(admin.phone_number).filter(|p| !p.is_empty()),
                address: admin.address,
                pin_code: admin.pin_code,
                role: UserRole::Admin,
            };
            repository::insert(conn, &new_user, Utc::now()).map(Some).context("Creating admin")
        })
        .await?;

    match created {
        Some(user) => {
            info!(user_id = %user.id, email = %user.email, "Admin account created");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Deletes accounts whose deletion grace period has ended. Returns how many.
///
/// # Errors
/// Fails when the database is unreachable.
pub async fn purge_expired_accounts(database: &Database) -> Result<usize, IdentityError> {
    let removed = database
        .call(|conn| {
            let tx = conn.transaction().map_err(vpms_database::DatabaseError::from)?;
            let removed = repository::purge_expired(&tx, Utc::now())?;
            tx.commit().map_err(vpms_database::DatabaseError::from)?;
            Ok::<_, IdentityError>(removed)
        })
        .await?;

    for id in &removed {
        info!(user_id = %id, "Expired account purged");
    }
    Ok(removed.len())
}

/// Runs [`purge_expired_accounts`] every `every` (at least one second), starting
/// immediately.
pub fn spawn_purge_task(database: Database, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = purge_expired_accounts(&database).await {
                error!(error = %e, "Account purge failed");
            }
        }
    })
}
