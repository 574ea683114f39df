mod auth;
mod profile;
mod users;

use crate::account;
use crate::repository;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use vpms_database::rusqlite::Connection;
use vpms_kernel::security::{hash_password, verify_password};
use vpms_kernel::server::{ApiError, ApiState};

/// Every identity route: auth, profile, the users resource and the admin listing.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(auth::sign_up))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
        .routes(routes!(profile::get_profile, profile::update_profile, profile::delete_profile))
        .routes(routes!(users::list_users, users::create_user))
        .routes(routes!(users::get_user, users::update_user, users::delete_user))
        .routes(routes!(users::admin_users))
}

const ID_ATTEMPTS: usize = 20;

/// Picks a free `@local123` id for `email`.
fn allocate_user_id(conn: &Connection, email: &str) -> Result<String, ApiError> {
    for _ in 0..ID_ATTEMPTS {
        let id = account::user_id_for(email, account::random_suffix()?);
        if !repository::id_exists(conn, &id)? {
            return Ok(id);
        }
    }
    Err(ApiError::conflict("Could not allocate a user id, please try again."))
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(ApiError::from)
}

async fn verify_off_thread(password: String, phc: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))
}
