//! Shared names: `OpenAPI` tags, redirect targets and fixed limits.

pub const SYSTEM_TAG: &str = "System";
pub const AUTH_TAG: &str = "Auth";
pub const PROFILE_TAG: &str = "Profile";
pub const USERS_TAG: &str = "Users";
pub const LOTS_TAG: &str = "Parking Lots";
pub const SPOTS_TAG: &str = "Parking Spots";
pub const VEHICLES_TAG: &str = "Vehicles";
pub const DASHBOARD_TAG: &str = "Dashboard";
pub const RESERVATIONS_TAG: &str = "Reservations";
pub const ADMIN_TAG: &str = "Admin";

/// Where an admin lands after logging in.
pub const ADMIN_HOME: &str = "/admin/parking-lots";
/// Where a regular user lands after logging in or signing up.
pub const USER_HOME: &str = "/user/dashboard";

pub const MIN_FLOOR_LEVEL: i64 = 1;
pub const MAX_FLOOR_LEVEL: i64 = 5;
/// Upper bound for `maximum_number_of_spots` on a single lot.
pub const MAX_SPOTS_PER_LOT: i64 = 1000;
