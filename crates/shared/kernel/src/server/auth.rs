//! Request guards backed by the session cookie.
//!
//! * [`CurrentUser`]: any logged-in, active account (401 otherwise).
//! * [`AdminUser`]: an admin account (403 for other roles).
//! * [`MaybeUser`]: never rejects.
//! * [`SessionToken`]: the raw token, for handlers that edit the session itself.

use super::error::ApiError;
use super::state::ApiState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use rusqlite::OptionalExtension;
use std::convert::Infallible;
use std::str::FromStr;
use tracing::{debug, warn};
use vpms_database::{DatabaseError, rusqlite};
use vpms_domain::types::UserRole;

const LOGIN_REQUIRED: &str = "Please log in to access this page.";

/// The authenticated account behind the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    /// Session token the request came with.
    pub token: String,
    pub search_location: Option<String>,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// A [`CurrentUser`] whose role is admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

/// `Some` when the request carries a valid session.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// Raw session token from the cookie, if present (not validated).
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

struct Principal {
    full_name: String,
    email: String,
    role: String,
    is_active: bool,
}

fn token_from(parts: &Parts, state: &ApiState) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(&state.config.security.session.cookie_name)
        .map(|cookie| cookie.value().to_owned())
}

async fn resolve(parts: &Parts, state: &ApiState) -> Result<CurrentUser, ApiError> {
    let token = token_from(parts, state).ok_or_else(|| ApiError::unauthorized(LOGIN_REQUIRED))?;
    let session = state.sessions.get(&token).ok_or_else(|| {
        debug!("Unknown or expired session token");
        ApiError::unauthorized(LOGIN_REQUIRED)
    })?;

    let user_id = session.user_id.clone();
    let principal = state
        .database
        .call(move |conn| {
            conn.query_row(
                "SELECT full_name, email, role, is_active FROM users WHERE id = ?1",
                [&user_id],
                |row| {
                    Ok(Principal {
                        full_name: row.get(0)?,
                        email: row.get(1)?,
                        role: row.get(2)?,
                        is_active: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::from)
        })
        .await?;

    let Some(principal) = principal.filter(|p| p.is_active) else {
        warn!(user_id = %session.user_id, "Session refers to a missing or inactive account");
        state.sessions.destroy(&token);
        return Err(ApiError::unauthorized(LOGIN_REQUIRED));
    };

    let role = UserRole::from_str(&principal.role)
        .map_err(|_| ApiError::internal(format!("unknown role '{}'", principal.role)))?;

    Ok(CurrentUser {
        id: session.user_id,
        full_name: principal.full_name,
        email: principal.email,
        role,
        token,
        search_location: session.search_location,
    })
}

impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await
    }
}

impl FromRequestParts<ApiState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let user = resolve(parts, state).await?;
        if !user.is_admin() {
            warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin tried an admin route");
            return Err(ApiError::forbidden("Access denied: admins only."));
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<ApiState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state).await.ok()))
    }
}

impl FromRequestParts<ApiState> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        Ok(Self(token_from(parts, state)))
    }
}
