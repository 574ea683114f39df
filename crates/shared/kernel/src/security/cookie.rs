use axum_extra::extract::cookie::{Cookie, SameSite};
use vpms_domain::config::SessionConfig;

/// Session cookie carrying `token`: `HttpOnly`, `SameSite=Lax`, `Path=/`, `Max-Age` = session TTL.
#[must_use]
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    let max_age = i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX);
    Cookie::build((config.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Cookie value that, when removed from a jar, makes the browser drop the session.
#[must_use]
pub fn clear_session_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), "")).path("/").build()
}
