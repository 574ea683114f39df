use super::{allocate_user_id, hash_off_thread};
use crate::model::{AdminUserRow, CreateUserRequest, NewUser, UpdateUserRequest, UserView};
use crate::repository::{self, AccountChanges};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::{info, warn};
use vpms_derive::api_handler;
use vpms_domain::constants::{ADMIN_TAG, USERS_TAG};
use vpms_domain::types::UserRole;
use vpms_kernel::server::{AdminUser, ApiError, ApiState, CurrentUser, ErrorResponse, MessageResponse};
use vpms_kernel::validation;

const USER_NOT_FOUND: &str = "User not found";

/// Trims optional contact fields; blank becomes `None`.
fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Regular (non-admin) accounts.
#[api_handler(
    get,
    path = "/api/users",
    responses(
        (status = OK, body = [UserView]),
        (status = FORBIDDEN, body = ErrorResponse),
    ),
    tag = USERS_TAG,
)]
pub(super) async fn list_users(
    State(state): State<ApiState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users =
        state.database.call(|conn| repository::list_by_role(conn, UserRole::User)).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// Creates a regular account without logging it in.
#[api_handler(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = CREATED, body = UserView),
        (status = BAD_REQUEST, description = "Email or phone already exists", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, body = ErrorResponse),
    ),
    tag = USERS_TAG,
)]
pub(super) async fn create_user(
    State(state): State<ApiState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let full_name = validation::length("Full name", &body.full_name, 3, 50)?;
    let email = validation::email(&body.email)?;
    let password = validation::required("Password", &body.password)?;
    let phone_number = optional(body.phone_number.as_deref());
    let address = optional(body.address.as_deref()).unwrap_or_default();
    let pin_code = optional(body.pin_code.as_deref()).unwrap_or_default();

    let password_hash = hash_off_thread(password).await?;

    let user = state
        .database
        .call(move |conn| {
            if repository::email_exists(conn, &email)? {
                return Err(ApiError::bad_request("Email already exists"));
            }
            if let Some(phone) = &phone_number
                && repository::phone_taken(conn, phone, None)?
            {
                return Err(ApiError::bad_request("Phone number already exists"));
            }
            let id = allocate_user_id(conn, &email)?;
            let new_user = NewUser {
                id,
                full_name,
                email,
                password_hash,
                phone_number,
                address,
                pin_code,
                role: UserRole::User,
            };
            Ok(repository::insert(conn, &new_user, Utc::now())?)
        })
        .await?;

    info!(user_id = %user.id, "Account created through the users resource");
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

#[api_handler(
    get,
    path = "/api/user/{id}",
    params(("id" = String, Path, description = "User id, e.g. `@asha123`")),
    responses(
        (status = OK, body = UserView),
        (status = NOT_FOUND, body = ErrorResponse),
    ),
    tag = USERS_TAG,
)]
pub(super) async fn get_user(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let found = state.database.call(move |conn| repository::find_by_id(conn, &id)).await?;
    found.map(|u| Json(UserView::from(u))).ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
}

/// Updates contact details. Allowed for the account itself and for admins.
#[api_handler(
    put,
    path = "/api/user/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = OK, body = UserView),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
    ),
    tag = USERS_TAG,
)]
pub(super) async fn update_user(
    State(state): State<ApiState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    if caller.id != id && !caller.is_admin() {
        warn!(caller = %caller.id, target = %id, "Refused to update another account");
        return Err(ApiError::forbidden("You can only update your own account."));
    }

    let full_name = validation::length("Full name", &body.full_name, 3, 50)?;
    let phone_number = optional(body.phone_number.as_deref());
    let address = optional(body.address.as_deref());
    let pin_code = optional(body.pin_code.as_deref());
    let password_hash = match optional(body.password.as_deref()) {
        Some(password) => Some(hash_off_thread(password).await?),
        None => None,
    };

    let target = id.clone();
    let updated = state
        .database
        .call(move |conn| {
            let Some(current) = repository::find_by_id(conn, &target)? else {
                return Err(ApiError::not_found(USER_NOT_FOUND));
            };
            if let Some(phone) = &phone_number
                && repository::phone_taken(conn, phone, Some(target.as_str()))?
            {
                return Err(ApiError::bad_request("Phone number already exists"));
            }
            let changes = AccountChanges {
                full_name: &full_name,
                phone_number: phone_number.as_deref().or(current.phone_number.as_deref()),
                address: address.as_deref().unwrap_or(&current.address),
                pin_code: pin_code.as_deref().unwrap_or(&current.pin_code),
                password_hash: password_hash.as_deref(),
            };
            repository::update_account(conn, &target, &changes, Utc::now())?;
            repository::find_by_id(conn, &target)?.ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
        })
        .await?;

    info!(user_id = %id, by = %caller.id, "Account updated");
    Ok(Json(UserView::from(updated)))
}

/// Removes a regular account with its vehicles and history.
#[api_handler(
    delete,
    path = "/api/user/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = OK, body = MessageResponse),
        (status = FORBIDDEN, description = "Target is an admin", body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "User has an active reservation", body = ErrorResponse),
    ),
    tag = USERS_TAG,
)]
pub(super) async fn delete_user(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = id.clone();
    state
        .database
        .call(move |conn| {
            let Some(user) = repository::find_by_id(conn, &target)? else {
                return Err(ApiError::not_found(USER_NOT_FOUND));
            };
            if user.role.is_admin() {
                return Err(ApiError::forbidden("Admin accounts cannot be deleted."));
            }
            if repository::has_active_reservation(conn, &target)? {
                return Err(ApiError::conflict(
                    "Cannot delete a user with an active reservation.",
                ));
            }
            repository::delete(conn, &target)?;
            Ok(())
        })
        .await?;

    let dropped = state.sessions.destroy_user(&id);
    info!(user_id = %id, by = %admin.id, sessions = dropped, "Account deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Regular accounts with vehicle and reservation counts.
#[api_handler(
    get,
    path = "/admin/users",
    responses(
        (status = OK, body = [AdminUserRow]),
        (status = FORBIDDEN, body = ErrorResponse),
    ),
    tag = ADMIN_TAG,
)]
pub(super) async fn admin_users(
    State(state): State<ApiState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminUserRow>>, ApiError> {
    Ok(Json(state.database.call(|conn| repository::admin_overview(conn)).await?))
}
