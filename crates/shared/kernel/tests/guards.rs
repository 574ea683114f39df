use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use tower::ServiceExt;
use vpms_kernel::database::{Database, DatabaseError, IN_MEMORY};
use vpms_kernel::domain::config::ApiConfig;
use vpms_kernel::server::{AdminUser, ApiState, CurrentUser, MaybeUser};

async fn state_with_user(id: &'static str, role: &'static str, active: bool) -> ApiState {
    let database = Database::builder().path(IN_MEMORY).init().await.expect("database");
    database
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, full_name, email, password_hash, role, is_active, created_at, updated_at)
                 VALUES (?1, 'Test Person', ?2, 'x', ?3, ?4, 'now', 'now')",
                (id, format!("{id}@example.com"), role, active),
            )?;
            Ok::<_, DatabaseError>(())
        })
        .await
        .expect("seed user");

    ApiState::builder().config(ApiConfig::default()).db(database).build().expect("state")
}

fn app(state: ApiState) -> Router {
    Router::new()
        .route("/me", get(|user: CurrentUser| async move { user.id }))
        .route("/admin", get(|AdminUser(user): AdminUser| async move { user.full_name }))
        .route(
            "/maybe",
            get(|MaybeUser(user): MaybeUser| async move {
                user.map_or_else(|| "anonymous".to_owned(), |u| u.id)
            }),
        )
        .with_state(state)
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("vpms_session={token}"));
    }
    builder.body(Body::empty()).expect("request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test]
async fn anonymous_requests_are_unauthorized() {
    let state = state_with_user("@asha123", "user", true).await;
    let response = app(state).oneshot(request("/me", None)).await.expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Please log in"));
}

#[tokio::test]
async fn valid_session_resolves_the_user() {
    let state = state_with_user("@asha123", "user", true).await;
    let token = state.sessions.create("@asha123");

    let response = app(state).oneshot(request("/me", Some(&token))).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "@asha123");
}

#[tokio::test]
async fn regular_users_are_forbidden_from_admin_routes() {
    let state = state_with_user("@asha123", "user", true).await;
    let token = state.sessions.create("@asha123");

    let response = app(state).oneshot(request("/admin", Some(&token))).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_pass_the_admin_guard() {
    let state = state_with_user("@boss100", "admin", true).await;
    let token = state.sessions.create("@boss100");

    let response = app(state).oneshot(request("/admin", Some(&token))).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Test Person");
}

#[tokio::test]
async fn inactive_accounts_lose_their_session() {
    let state = state_with_user("@gone404", "user", false).await;
    let token = state.sessions.create("@gone404");

    let response =
        app(state.clone()).oneshot(request("/me", Some(&token))).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(state.sessions.get(&token).is_none());
}

#[tokio::test]
async fn maybe_user_never_rejects() {
    let state = state_with_user("@asha123", "user", true).await;
    let token = state.sessions.create("@asha123");

    let anonymous = app(state.clone()).oneshot(request("/maybe", None)).await.expect("response");
    assert_eq!(body_text(anonymous).await, "anonymous");

    let known = app(state).oneshot(request("/maybe", Some(&token))).await.expect("response");
    assert_eq!(body_text(known).await, "@asha123");
}
