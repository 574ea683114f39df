use crate::Identity;
use crate::account;
use crate::model::{ProfileUpdate, UserView};
use crate::repository;
use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use tracing::info;
use vpms_derive::api_handler;
use vpms_domain::constants::PROFILE_TAG;
use vpms_kernel::security::clear_session_cookie;
use vpms_kernel::server::{ApiError, ApiState, CurrentUser, ErrorResponse, MessageResponse};
use vpms_kernel::validation;

#[api_handler(
    get,
    path = "/user/profile",
    responses((status = OK, body = UserView), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = PROFILE_TAG,
)]
pub(super) async fn get_profile(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<UserView>, ApiError> {
    let id = user.id;
    let found = state.database.call(move |conn| repository::find_by_id(conn, &id)).await?;
    found.map(|u| Json(UserView::from(u))).ok_or_else(|| ApiError::not_found("User not found"))
}

#[api_handler(
    put,
    path = "/user/profile",
    request_body = ProfileUpdate,
    responses(
        (status = OK, body = UserView),
        (status = UNPROCESSABLE_ENTITY, body = ErrorResponse),
    ),
    tag = PROFILE_TAG,
)]
pub(super) async fn update_profile(
    State(state): State<ApiState>,
    user: CurrentUser,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<UserView>, ApiError> {
    let full_name = validation::length("Full name", &body.full_name, 3, 50)?;
    let bio = body.bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
    let date_of_birth = body
        .date_of_birth
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| validation::date("Date of birth", d))
        .transpose()?;

    let id = user.id.clone();
    let updated = state
        .database
        .call(move |conn| {
            repository::update_profile(conn, &id, &full_name, bio.as_deref(), date_of_birth, Utc::now())?;
            repository::find_by_id(conn, &id)
        })
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(UserView::from(updated)))
}

/// Deactivates the account and schedules its removal after the grace period.
/// Logging in again before then cancels the deletion.
#[api_handler(
    delete,
    path = "/user/profile",
    responses(
        (status = OK, body = MessageResponse),
        (status = FORBIDDEN, description = "Admins cannot delete their own profile", body = ErrorResponse),
        (status = CONFLICT, description = "A vehicle is still parked", body = ErrorResponse),
    ),
    tag = PROFILE_TAG,
)]
pub(super) async fn delete_profile(
    State(state): State<ApiState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if user.is_admin() {
        return Err(ApiError::forbidden("Admins cannot delete their own profile."));
    }

    let grace_days = state
        .try_get_slice::<Identity>()
        .map_err(|e| ApiError::internal(e.to_string()))?
        .deletion_grace_days;
    let now = Utc::now();
    let deadline = account::deletion_deadline(now, grace_days);

    let id = user.id.clone();
    state
        .database
        .call(move |conn| {
            if repository::has_active_reservation(conn, &id)? {
                return Err(ApiError::conflict(
                    "Release your parked vehicle before deleting your profile.",
                ));
            }
            repository::schedule_deletion(conn, &id, deadline, now)?;
            Ok(())
        })
        .await?;
    let dropped = state.sessions.destroy_user(&user.id);
    info!(user_id = %user.id, %deadline, sessions = dropped, "Account scheduled for deletion");

    let jar = jar.remove(clear_session_cookie(&state.config.security.session));
    Ok((
        jar,
        Json(MessageResponse::new(format!(
            "Your account will be deleted on {}. Log in before then to cancel.",
            deadline.format("%Y-%m-%d %H:%M UTC")
        ))),
    ))
}
