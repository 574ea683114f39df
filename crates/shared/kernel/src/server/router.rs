use super::error::ApiError;
use super::health;
use super::state::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Routes every deployment exposes regardless of slices (`/health`).
pub fn system_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(health::health_handler))
}

/// JSON fallback for unknown routes.
#[allow(clippy::unused_async)]
pub async fn not_found_handler() -> ApiError {
    ApiError::not_found("Not Found")
}
