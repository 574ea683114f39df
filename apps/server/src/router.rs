use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};
use vpms::domain::config::CorsConfig;
use vpms::domain::constants::{
    ADMIN_TAG, AUTH_TAG, DASHBOARD_TAG, LOTS_TAG, PROFILE_TAG, RESERVATIONS_TAG, SPOTS_TAG,
    SYSTEM_TAG, USERS_TAG, VEHICLES_TAG,
};
use vpms::kernel::server::{ApiState, not_found_handler};

#[derive(OpenApi)]
#[openapi(
    info(title = "Vehicle Parking Management System"),
    tags(
        (name = SYSTEM_TAG, description = "Liveness"),
        (name = AUTH_TAG, description = "Sign-up, login and sessions"),
        (name = PROFILE_TAG, description = "The caller's own account"),
        (name = USERS_TAG, description = "User accounts"),
        (name = LOTS_TAG, description = "Parking lots"),
        (name = SPOTS_TAG, description = "Parking spots"),
        (name = VEHICLES_TAG, description = "Registered vehicles"),
        (name = DASHBOARD_TAG, description = "User dashboard"),
        (name = RESERVATIONS_TAG, description = "Parking, release and payment"),
        (name = ADMIN_TAG, description = "Admin search and reports"),
    )
)]
struct ApiDoc;

pub(crate) fn init(state: ApiState) -> Router {
    let cors = cors_layer(&state.config.cors);

    // Separate the OpenAPI routes and the API documentation object
    let (api_routes, api_doc) =
        OpenApiRouter::with_openapi(ApiDoc::openapi()).merge(vpms::router()).split_for_parts();

    Router::new()
        .route("/", get(banner))
        .merge(api_routes)
        .merge(Scalar::with_url("/swagger", api_doc))
        .fallback(not_found_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    // Cookies only travel with an explicit origin list.
    layer.allow_origin(origins).allow_credentials(true)
}

#[allow(clippy::unused_async)]
async fn banner() -> Json<Value> {
    Json(json!({
        "service": "Vehicle Parking Management System",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger",
        "health": "/health",
    }))
}
