//! Parking feature slice.
//!
//! Admins manage lots and spots; users register vehicles, park in the lowest free
//! spot of a lot, release (which bills the stay) and pay. Every multi-row change
//! runs in one `SQLite` transaction, so spot status always matches the open
//! reservations.

pub mod billing;
mod error;
mod handlers;
pub mod model;
pub mod repository;

pub use crate::error::{ParkingError, ParkingErrorExt};
pub use crate::handlers::router;

use crate::billing::BillingPolicy;
use tracing::info;
use vpms_domain::config::ApiConfig;
use vpms_domain::registry::InitializedSlice;

/// Parking settings shared with the handlers.
#[vpms_derive::vpms_slice]
pub struct Parking {
    pub billing: BillingPolicy,
}

/// Initializes the parking slice from `parking` config.
///
/// # Errors
/// Returns [`ParkingError::Config`] for a non-positive minimum stay or a negative
/// payment tolerance.
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, ParkingError> {
    let billing = BillingPolicy {
        minimum_hours: config.parking.minimum_billable_hours,
        payment_tolerance: config.parking.payment_tolerance,
    };
    if !(billing.minimum_hours > 0.0 && billing.minimum_hours.is_finite()) {
        return Err(ParkingError::Config {
            message: "minimum_billable_hours must be a positive number".into(),
            context: Some("parking.minimum_billable_hours".into()),
        });
    }
    if !(billing.payment_tolerance >= 0.0 && billing.payment_tolerance.is_finite()) {
        return Err(ParkingError::Config {
            message: "payment_tolerance must not be negative".into(),
            context: Some("parking.payment_tolerance".into()),
        });
    }

    info!(?billing, "Parking feature initialized");
    Ok(InitializedSlice::new(Parking::new(ParkingInner { billing })))
}
