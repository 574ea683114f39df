//! Axum building blocks shared by every slice.

mod auth;
mod error;
mod health;
mod response;
mod router;
mod state;

pub use auth::{AdminUser, CurrentUser, MaybeUser, SessionToken};
pub use error::{ApiError, ApiErrorExt, ErrorResponse};
pub use health::HealthResponse;
pub use response::MessageResponse;
pub use router::{not_found_handler, system_router};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
