//! Closed sets of values shared by storage and the HTTP API.
//!
//! Every enum round-trips through the same text form in JSON, in query strings
//! and in `SQLite` columns (`AsRef<str>` to write, `FromStr` to read).

use crate::constants::{ADMIN_HOME, USER_HOME};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Account role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Landing page after a successful login.
    #[must_use]
    pub const fn home(self) -> &'static str {
        match self {
            Self::Admin => ADMIN_HOME,
            Self::User => USER_HOME,
        }
    }
}

/// Occupancy of a single parking spot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotStatus {
    #[default]
    Available,
    Occupied,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
}

/// Accepted ways to settle a released reservation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    Card,
    Netbanking,
    Wallet,
    Paypal,
    Crypto,
    BankTransfer,
}

/// Column the admin search runs against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchField {
    UserId,
    FullName,
    Email,
    PhoneNumber,
    Location,
    VehicleNumber,
    PinCode,
}
