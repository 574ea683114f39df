use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use vpms_identity::repository;
use vpms_kernel::database::rusqlite::params;
use vpms_kernel::database::{Database, DatabaseError, IN_MEMORY};
use vpms_kernel::domain::config::ApiConfig;
use vpms_kernel::server::ApiState;

async fn state() -> ApiState {
    let config = ApiConfig::default();
    let database = Database::builder().path(IN_MEMORY).init().await.expect("database");
    vpms_identity::bootstrap_admin(&database, &config.security.admin).await.expect("admin");

    ApiState::builder()
        .config(config.clone())
        .db(database)
        .register_slice(vpms_identity::init(&config).expect("slice"))
        .build()
        .expect("state")
}

fn app(state: &ApiState) -> Router {
    let (router, _api) = vpms_identity::router().split_for_parts();
    router.with_state(state.clone())
}

async fn send(
    state: &ApiState,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app(state).oneshot(request).await.expect("response");
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, json)
}

fn sign_up_body(email: &str, phone: &str) -> Value {
    json!({
        "full_name": "Asha Rao",
        "email": email,
        "password": "secret-pass",
        "confirm_password": "secret-pass",
        "phone_number": phone,
        "address": "12 Lake Road, Pune",
        "pin_code": "411001",
    })
}

async fn signed_up(state: &ApiState) -> (String, String) {
    let (status, cookie, body) = send(
        state,
        Method::POST,
        "/auth/sign-up",
        None,
        Some(sign_up_body("asha@example.com", "9876543210")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["user"]["id"].as_str().expect("id").to_owned();
    (id, cookie.expect("session cookie"))
}

async fn admin_cookie(state: &ApiState) -> String {
    let (status, cookie, body) = send(
        state,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "sharib@gmail.com", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], "/admin/parking-lots");
    cookie.expect("session cookie")
}

#[tokio::test]
async fn sign_up_logs_the_account_in() {
    let state = state().await;
    let (id, cookie) = signed_up(&state).await;

    assert!(id.starts_with("@asha"));
    assert_eq!(id.len(), "@asha".len() + 3);
    assert!(cookie.starts_with("vpms_session="));

    let (status, _, me) = send(&state, Method::GET, "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "asha@example.com");
    assert_eq!(me["role"], "user");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_on_sign_up_and_bad_request_on_the_resource() {
    let state = state().await;
    signed_up(&state).await;

    let (status, _, body) = send(
        &state,
        Method::POST,
        "/auth/sign-up",
        None,
        Some(sign_up_body("asha@example.com", "9000000001")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered. Please use a different email.");

    let (status, _, body) = send(
        &state,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "full_name": "Asha Two", "email": "asha@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn sign_up_validates_the_form() {
    let state = state().await;
    let mut body = sign_up_body("asha@example.com", "9876543210");
    body["confirm_password"] = json!("different");

    let (status, _, _) = send(&state, Method::POST, "/auth/sign-up", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _, _) = send(
        &state,
        Method::POST,
        "/auth/sign-up",
        None,
        Some(sign_up_body("not-an-email", "9876543210")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let state = state().await;
    signed_up(&state).await;

    let (status, cookie, body) = send(
        &state,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
    assert_eq!(body["message"], "Invalid email or password.");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let state = state().await;
    let (_, cookie) = signed_up(&state).await;

    let (status, _, _) = send(&state, Method::POST, "/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&state, Method::GET, "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_checks_the_date() {
    let state = state().await;
    let (_, cookie) = signed_up(&state).await;

    let (status, _, body) = send(
        &state,
        Method::PUT,
        "/user/profile",
        Some(&cookie),
        Some(json!({ "full_name": "Asha R", "bio": "Commuter", "date_of_birth": "1994-02-17" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Asha R");
    assert_eq!(body["date_of_birth"], "1994-02-17");

    let (status, _, _) = send(
        &state,
        Method::PUT,
        "/user/profile",
        Some(&cookie),
        Some(json!({ "full_name": "Asha R", "date_of_birth": "17/02/1994" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

/// Parks a vehicle of `user_id` in a fresh one-spot lot. Returns the spot id.
async fn park_for(state: &ApiState, user_id: &str) -> i64 {
    let user_id = user_id.to_owned();
    state
        .database
        .call(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO parking_lots (name, prime_location_name, price_per_hour, address,
                     pin_code, maximum_number_of_spots, created_at, updated_at)
                 VALUES ('Station Plaza', 'Station', 40, 'Station Road', '411045', 1, ?1, ?1)",
                [now],
            )?;
            let lot_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO parking_spots (spot_number, lot_id, status, created_at, updated_at)
                 VALUES (?1, ?2, 'OCCUPIED', ?3, ?3)",
                params![format!("{lot_id}-1"), lot_id, now],
            )?;
            let spot_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO reservations (spot_id, lot_id, user_id, vehicle_number,
                     reservation_timestamp, parking_timestamp)
                 VALUES (?1, ?2, ?3, 'MH12AB1234', ?4, ?4)",
                params![spot_id, lot_id, user_id, now],
            )?;
            Ok::<_, DatabaseError>(spot_id)
        })
        .await
        .expect("parked vehicle")
}

async fn spot_status(state: &ApiState, spot_id: i64) -> String {
    state
        .database
        .call(move |conn| {
            conn.query_row("SELECT status FROM parking_spots WHERE id = ?1", [spot_id], |r| r.get(0))
                .map_err(DatabaseError::from)
        })
        .await
        .expect("spot status")
}

#[tokio::test]
async fn soft_deleted_account_is_restored_by_logging_in() {
    let state = state().await;
    let (id, cookie) = signed_up(&state).await;

    let (status, _, _) = send(&state, Method::DELETE, "/user/profile", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&state, Method::GET, "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, body) = send(
        &state,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome back! Your account deletion was canceled.");
    assert_eq!(body["user"]["is_active"], true);
    assert!(cookie.is_some());

    let user = state
        .database
        .call(move |conn| repository::find_by_id(conn, &id))
        .await
        .expect("query")
        .expect("user");
    assert!(user.scheduled_delete_at.is_none());
}

#[tokio::test]
async fn login_after_the_grace_period_is_refused_and_purge_removes_the_account() {
    let state = state().await;
    let (id, _) = signed_up(&state).await;

    let target = id.clone();
    state
        .database
        .call(move |conn| {
            let past = Utc::now() - Duration::days(1);
            repository::schedule_deletion(conn, &target, past, past)
        })
        .await
        .expect("schedule");

    let (status, _, body) = send(
        &state,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("permanently removed"));

    let purged = vpms_identity::purge_expired_accounts(&state.database).await.expect("purge");
    assert_eq!(purged, 1);
    let exists = state
        .database
        .call(move |conn| repository::id_exists(conn, &id))
        .await
        .expect("query");
    assert!(!exists);
}

#[tokio::test]
async fn profile_with_a_parked_vehicle_cannot_be_deleted() {
    let state = state().await;
    let (id, cookie) = signed_up(&state).await;
    let spot_id = park_for(&state, &id).await;

    let (status, _, body) = send(&state, Method::DELETE, "/user/profile", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _, me) = send(&state, Method::GET, "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_active"], true);
    assert_eq!(spot_status(&state, spot_id).await, "OCCUPIED");
}

#[tokio::test]
async fn purge_frees_the_spots_of_removed_accounts() {
    let state = state().await;
    let (id, _) = signed_up(&state).await;
    let spot_id = park_for(&state, &id).await;

    let target = id.clone();
    state
        .database
        .call(move |conn| {
            let past = Utc::now() - Duration::days(1);
            repository::schedule_deletion(conn, &target, past, past)
        })
        .await
        .expect("schedule");

    let purged = vpms_identity::purge_expired_accounts(&state.database).await.expect("purge");
    assert_eq!(purged, 1);
    assert_eq!(spot_status(&state, spot_id).await, "AVAILABLE");

    let open: i64 = state
        .database
        .call(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM reservations WHERE leaving_timestamp IS NULL",
                [],
                |r| r.get(0),
            )
            .map_err(DatabaseError::from)
        })
        .await
        .expect("count");
    assert_eq!(open, 0);
}

#[tokio::test]
async fn admins_cannot_delete_their_own_profile() {
    let state = state().await;
    let cookie = admin_cookie(&state).await;

    let (status, _, _) = send(&state, Method::DELETE, "/user/profile", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn users_resource_is_admin_only() {
    let state = state().await;
    let (id, user_cookie) = signed_up(&state).await;

    let (status, _, _) = send(&state, Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&state, Method::GET, "/api/users", Some(&user_cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_cookie(&state).await;
    let (status, _, body) = send(&state, Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().expect("list").iter().filter_map(|u| u["id"].as_str()).collect();
    assert_eq!(ids, vec![id.as_str()]);

    let (status, _, body) = send(&state, Method::GET, "/api/user/@nobody000", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, _, body) = send(&state, Method::GET, "/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["vehicles"], 0);
    assert_eq!(body[0]["id"], id.as_str());
}

#[tokio::test]
async fn accounts_update_themselves_but_not_others() {
    let state = state().await;
    let (id, cookie) = signed_up(&state).await;

    let (status, _, body) = send(
        &state,
        Method::PUT,
        &format!("/api/user/{id}"),
        Some(&cookie),
        Some(json!({ "full_name": "Asha Rao", "address": "7 Hill Street", "password": "new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "7 Hill Street");
    assert_eq!(body["pin_code"], "411001");

    let (status, _, _) = send(
        &state,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &state,
        Method::PUT,
        "/api/user/@sharib123",
        Some(&cookie),
        Some(json!({ "full_name": "Someone Else" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_deletes_regular_accounts_only() {
    let state = state().await;
    let (id, user_cookie) = signed_up(&state).await;
    let admin = admin_cookie(&state).await;

    let (status, _, _) = send(&state, Method::DELETE, "/api/user/@sharib123", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) =
        send(&state, Method::DELETE, &format!("/api/user/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _, _) = send(&state, Method::GET, "/auth/me", Some(&user_cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bootstrap_runs_once() {
    let config = ApiConfig::default();
    let database = Database::builder().path(IN_MEMORY).init().await.expect("database");

    assert!(vpms_identity::bootstrap_admin(&database, &config.security.admin).await.expect("first"));
    assert!(!vpms_identity::bootstrap_admin(&database, &config.security.admin).await.expect("second"));

    let admins = database
        .call(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users WHERE role = 'admin'", [], |r| r.get::<_, i64>(0))
                .map_err(DatabaseError::from)
        })
        .await
        .expect("count");
    assert_eq!(admins, 1);
}
