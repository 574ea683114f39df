use super::{allocate_user_id, hash_off_thread, verify_off_thread};
use crate::account::{self, LoginOutcome};
use crate::model::{AuthResponse, LoginRequest, NewUser, SignUpRequest, UserView};
use crate::repository;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use tracing::{info, warn};
use vpms_derive::api_handler;
use vpms_domain::constants::AUTH_TAG;
use vpms_domain::types::UserRole;
use vpms_kernel::security::{clear_session_cookie, session_cookie};
use vpms_kernel::server::{
    ApiError, ApiState, CurrentUser, ErrorResponse, MessageResponse, SessionToken,
};
use vpms_kernel::validation;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// Registers a regular account and logs it in.
#[api_handler(
    post,
    path = "/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = CREATED, description = "Account created, session cookie set", body = AuthResponse),
        (status = CONFLICT, description = "Email or phone already registered", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid form data", body = ErrorResponse),
    ),
    tag = AUTH_TAG,
)]
pub(super) async fn sign_up(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let full_name = validation::length("Full name", &body.full_name, 3, 50)?;
    let email = validation::email(&body.email)?;
    let password = validation::required("Password", &body.password)?;
    if body.confirm_password.trim() != password {
        return Err(ApiError::validation("Passwords must match."));
    }
    let phone_number = validation::length("Phone number", &body.phone_number, 10, 15)?;
    let address = validation::required("Address", &body.address)?;
    let pin_code = validation::length("PIN code", &body.pin_code, 6, 10)?;

    let password_hash = hash_off_thread(password).await?;

    let user = state
        .database
        .call(move |conn| {
            if repository::email_exists(conn, &email)? {
                return Err(ApiError::conflict(
                    "Email already registered. Please use a different email.",
                ));
            }
            if repository::phone_taken(conn, &phone_number, None)? {
                return Err(ApiError::conflict(
                    "Phone number already registered. Please use a different phone number.",
                ));
            }
            let id = allocate_user_id(conn, &email)?;
            let new_user = NewUser {
                id,
                full_name,
                email,
                password_hash,
                phone_number: Some(phone_number),
                address,
                pin_code,
                role: UserRole::User,
            };
            Ok(repository::insert(conn, &new_user, Utc::now())?)
        })
        .await?;

    let token = state.sessions.create(user.id.clone());
    let jar = jar.add(session_cookie(&state.config.security.session, token));
    info!(user_id = %user.id, email = %user.email, "Account registered");

    let body = AuthResponse {
        message: format!("Account created successfully! You are logged in as {}", user.full_name),
        redirect: user.role.home().to_owned(),
        user: UserView::from(user),
    };
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// Logs in with email and password.
///
/// Logging into an account that is scheduled for deletion cancels the deletion while
/// the grace period lasts.
#[api_handler(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = OK, description = "Logged in, session cookie set", body = AuthResponse),
        (status = UNAUTHORIZED, description = "Wrong email or password", body = ErrorResponse),
        (status = FORBIDDEN, description = "Account inactive or removed", body = ErrorResponse),
    ),
    tag = AUTH_TAG,
)]
pub(super) async fn login(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let email = body.email.trim().to_owned();
    let found = state.database.call(move |conn| repository::find_by_email(conn, &email)).await?;

    let Some(mut user) = found else {
        warn!("Login failed due to wrong credentials");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };
    if !verify_off_thread(body.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "Login failed due to wrong credentials");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let now = Utc::now();
    let message = match account::login_outcome(&user, now) {
        LoginOutcome::Active => "Login successful!",
        LoginOutcome::Restored => {
            let id = user.id.clone();
            state.database.call(move |conn| repository::cancel_deletion(conn, &id, now)).await?;
            user.is_active = true;
            user.scheduled_delete_at = None;
            info!(user_id = %user.id, "Account deletion canceled by logging in");
            "Welcome back! Your account deletion was canceled."
        }
        LoginOutcome::Expired => {
            warn!(user_id = %user.id, "Login attempted after the deletion deadline");
            return Err(ApiError::forbidden(
                "Your account was scheduled for deletion and is now permanently removed.",
            ));
        }
        LoginOutcome::Inactive => {
            warn!(user_id = %user.id, "Login attempted on an inactive account");
            return Err(ApiError::forbidden("Your account is inactive. Please contact support."));
        }
    };

    let token = state.sessions.create(user.id.clone());
    let jar = jar.add(session_cookie(&state.config.security.session, token));
    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok((
        jar,
        Json(AuthResponse {
            message: message.to_owned(),
            redirect: user.role.home().to_owned(),
            user: UserView::from(user),
        }),
    ))
}

/// Ends the current session and clears the cookie. Always succeeds.
#[api_handler(
    post,
    path = "/auth/logout",
    responses((status = OK, description = "Session ended", body = MessageResponse)),
    tag = AUTH_TAG,
)]
pub(super) async fn logout(
    State(state): State<ApiState>,
    SessionToken(token): SessionToken,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(token) = token {
        if let Some(session) = state.sessions.get(&token) {
            info!(user_id = %session.user_id, "User logged out");
        }
        state.sessions.destroy(&token);
    }
    let jar = jar.remove(clear_session_cookie(&state.config.security.session));
    (jar, Json(MessageResponse::new("You have been logged out.")))
}

/// The logged-in account.
#[api_handler(
    get,
    path = "/auth/me",
    responses(
        (status = OK, body = UserView),
        (status = UNAUTHORIZED, body = ErrorResponse),
    ),
    tag = AUTH_TAG,
)]
pub(super) async fn me(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<UserView>, ApiError> {
    let id = user.id;
    let found = state.database.call(move |conn| repository::find_by_id(conn, &id)).await?;
    found.map(|u| Json(UserView::from(u))).ok_or_else(|| ApiError::not_found("User not found"))
}
