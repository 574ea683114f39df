//! Facade crate for the parking system's feature slices and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Call [`init`] once at startup to build the feature slices for the API state.
//! - Mount [`router`] to get every route with its `OpenAPI` description.

pub use vpms_database as database;
pub use vpms_domain as domain;
pub use vpms_kernel as kernel;

use std::borrow::Cow;
use utoipa_axum::router::OpenApiRouter;
use vpms_domain::config::ApiConfig;
use vpms_domain::registry::InitializedSlice;
use vpms_identity::IdentityError;
use vpms_kernel::server::{ApiState, system_router};
use vpms_parking::ParkingError;

/// Feature registry for runtime introspection.
pub mod features {
    pub use vpms_identity as identity;
    pub use vpms_parking as parking;

    /// Slices compiled into this build, in initialization order.
    pub const ENABLED: &[&str] = &["identity", "parking"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

#[vpms_derive::vpms_error]
pub enum InitError {
    #[error("Identity initialization failed{}: {source}", format_context(.context))]
    Identity {
        #[source]
        source: IdentityError,
        context: Option<Cow<'static, str>>,
    },
    #[error("Parking initialization failed{}: {source}", format_context(.context))]
    Parking {
        #[source]
        source: ParkingError,
        context: Option<Cow<'static, str>>,
    },
}

/// Initializes every feature slice.
///
/// # Errors
/// Returns the first slice that rejects the configuration.
pub fn init(config: &ApiConfig) -> Result<Vec<InitializedSlice>, InitError> {
    Ok(vec![features::identity::init(config)?, features::parking::init(config)?])
}

/// Every route of the API: `/health`, the identity slice and the parking slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .merge(system_router())
        .merge(features::identity::router())
        .merge(features::parking::router())
}
