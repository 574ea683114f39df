use chrono::{DateTime, NaiveTime, Utc};
use vpms_database::rusqlite::types::Type;
use vpms_database::rusqlite::{self, Row};
use vpms_derive::api_model;
use vpms_domain::types::{FuelType, PaymentMethod, SearchField, SpotStatus};

/// Parses a strum-backed enum column.
fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Lots keep their hours as `HH:MM` text.
pub(crate) const CLOCK_FORMAT: &str = "%H:%M";

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ParkingLot {
    pub id: i64,
    pub name: String,
    pub prime_location_name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pin_code: String,
    pub floor_level: i64,
    pub maximum_number_of_spots: i64,
    pub revenue: f64,
    pub is_active: bool,
    /// `HH:MM`
    pub open_time: Option<String>,
    /// `HH:MM`; earlier than `open_time` for overnight lots
    pub close_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const LOT_COLUMNS: &str = "id, name, prime_location_name, price_per_hour, address, \
     pin_code, floor_level, maximum_number_of_spots, revenue, is_active, open_time, close_time, \
     created_at, updated_at";

impl ParkingLot {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            prime_location_name: row.get(2)?,
            price_per_hour: row.get(3)?,
            address: row.get(4)?,
            pin_code: row.get(5)?,
            floor_level: row.get(6)?,
            maximum_number_of_spots: row.get(7)?,
            revenue: row.get(8)?,
            is_active: row.get(9)?,
            open_time: row.get(10)?,
            close_time: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    /// Opening hours as times; unparsable values count as unset.
    #[must_use]
    pub fn hours(&self) -> (Option<NaiveTime>, Option<NaiveTime>) {
        let parse = |v: &Option<String>| {
            v.as_deref().and_then(|s| NaiveTime::parse_from_str(s, CLOCK_FORMAT).ok())
        };
        (parse(&self.open_time), parse(&self.close_time))
    }
}

/// A lot with its live spot counts.
#[api_model(deny_unknown_fields = false)]
#[derive(Clone, PartialEq)]
pub struct LotView {
    #[serde(flatten)]
    pub lot: ParkingLot,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

/// `GET /admin/parking-lot/{id}`.
#[api_model(deny_unknown_fields = false)]
pub struct LotDetails {
    #[serde(flatten)]
    pub lot: LotView,
    pub spots: Vec<ParkingSpot>,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ParkingSpot {
    pub id: i64,
    /// `{lot_id}-{n}`
    pub spot_number: String,
    pub lot_id: i64,
    pub status: SpotStatus,
    pub is_covered: bool,
    pub revenue: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const SPOT_COLUMNS: &str =
    "id, spot_number, lot_id, status, is_covered, revenue, is_active, created_at, updated_at";

impl ParkingSpot {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            spot_number: row.get(1)?,
            lot_id: row.get(2)?,
            status: enum_column(row, 3)?,
            is_covered: row.get(4)?,
            revenue: row.get(5)?,
            is_active: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// The `n` of `{lot_id}-{n}`.
    #[must_use]
    pub fn ordinal(&self) -> Option<i64> {
        spot_ordinal(&self.spot_number)
    }
}

#[must_use]
pub fn spot_ordinal(spot_number: &str) -> Option<i64> {
    spot_number.rsplit_once('-').and_then(|(_, n)| n.parse().ok())
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Vehicle {
    /// Upper-cased registration number
    pub vehicle_number: String,
    pub user_id: String,
    pub fuel_type: FuelType,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const VEHICLE_COLUMNS: &str =
    "vehicle_number, user_id, fuel_type, brand, model, color, created_at, updated_at";

impl Vehicle {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            vehicle_number: row.get(0)?,
            user_id: row.get(1)?,
            fuel_type: enum_column(row, 2)?,
            brand: row.get(3)?,
            model: row.get(4)?,
            color: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

/// A reservation joined with the names a person needs to read it.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Reservation {
    pub id: i64,
    pub spot_id: i64,
    pub spot_number: String,
    pub lot_id: i64,
    pub lot_name: String,
    pub user_id: String,
    pub vehicle_number: String,
    pub reservation_timestamp: DateTime<Utc>,
    pub parking_timestamp: DateTime<Utc>,
    /// `None` while the vehicle is parked
    pub leaving_timestamp: Option<DateTime<Utc>>,
    pub duration_hours: Option<f64>,
    pub total_cost: Option<f64>,
    pub is_paid: bool,
}

pub(crate) const RESERVATION_SELECT: &str = "SELECT r.id, r.spot_id, s.spot_number, r.lot_id, \
     l.name, r.user_id, r.vehicle_number, r.reservation_timestamp, r.parking_timestamp, \
     r.leaving_timestamp, r.duration_hours, r.total_cost, r.is_paid
     FROM reservations r
     JOIN parking_spots s ON s.id = r.spot_id
     JOIN parking_lots l ON l.id = r.lot_id";

impl Reservation {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            spot_id: row.get(1)?,
            spot_number: row.get(2)?,
            lot_id: row.get(3)?,
            lot_name: row.get(4)?,
            user_id: row.get(5)?,
            vehicle_number: row.get(6)?,
            reservation_timestamp: row.get(7)?,
            parking_timestamp: row.get(8)?,
            leaving_timestamp: row.get(9)?,
            duration_hours: row.get(10)?,
            total_cost: row.get(11)?,
            is_paid: row.get(12)?,
        })
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.leaving_timestamp.is_none()
    }
}

#[api_model]
pub struct Payment {
    pub id: i64,
    pub reservation_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

// Requests

/// Body for creating a lot (admin form and `POST /api/parking-lots`).
#[api_model]
pub struct LotRequest {
    pub name: String,
    pub prime_location_name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pin_code: String,
    /// 1 to 5, defaults to 1
    pub floor_level: Option<i64>,
    pub maximum_number_of_spots: i64,
    pub is_active: Option<bool>,
    /// `HH:MM`
    pub open_time: Option<String>,
    /// `HH:MM`
    pub close_time: Option<String>,
}

/// Body of `PUT /admin/parking-lot/{id}/edit`. Location details are read-only.
#[api_model]
pub struct LotSettings {
    pub price_per_hour: f64,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_active: bool,
}

/// Body of `PUT /api/parking-lot/{id}`. Missing fields stay unchanged.
#[api_model]
#[derive(Default)]
pub struct LotPatch {
    pub name: Option<String>,
    pub prime_location_name: Option<String>,
    pub price_per_hour: Option<f64>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub floor_level: Option<i64>,
    /// Grows or shrinks the lot
    pub maximum_number_of_spots: Option<i64>,
    pub is_active: Option<bool>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

#[api_model]
pub struct SpotUpdate {
    pub status: Option<SpotStatus>,
    pub is_covered: Option<bool>,
    pub is_active: Option<bool>,
}

#[api_model]
pub struct VehicleRequest {
    pub vehicle_number: String,
    pub fuel_type: FuelType,
    /// Owner; defaults to the caller. Only admins may register for someone else.
    pub user_id: Option<String>,
    pub brand: String,
    pub model: String,
    pub color: String,
}

#[api_model]
pub struct VehicleUpdate {
    pub fuel_type: Option<FuelType>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    /// New owner (admins only)
    pub user_id: Option<String>,
}

/// Body of `POST /user/reserve/{lot_id}`.
#[api_model]
pub struct ReserveRequest {
    pub vehicle_number: String,
    pub fuel_type: FuelType,
    pub brand: String,
    pub model: String,
    pub color: String,
}

#[api_model]
pub struct PaymentRequest {
    pub amount: f64,
    pub payment_method: PaymentMethod,
}

#[api_model]
pub struct SearchRequest {
    pub location: String,
}

#[api_model]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminSearchQuery {
    pub search_by: SearchField,
    pub search_value: String,
}

// Responses

#[api_model]
pub struct Dashboard {
    pub search_location: Option<String>,
    pub parking_lots: Vec<LotView>,
    /// Newest first
    pub reservations: Vec<Reservation>,
}

/// Bill shown before releasing, and the released state after.
#[api_model]
pub struct ReleaseQuote {
    pub reservation_id: i64,
    pub vehicle_number: String,
    pub spot_number: String,
    pub lot_name: String,
    pub parking_timestamp: DateTime<Utc>,
    pub leaving_timestamp: DateTime<Utc>,
    pub duration_hours: f64,
    pub price_per_hour: f64,
    pub total_cost: f64,
}

#[api_model]
pub struct UserMatch {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
}

#[api_model]
pub struct SearchResults {
    pub search_by: SearchField,
    pub search_value: String,
    pub users: Vec<UserMatch>,
    pub parking_lots: Vec<LotView>,
    pub vehicles: Vec<Vehicle>,
}

#[api_model]
pub struct LotRevenue {
    pub lot_id: i64,
    pub name: String,
    pub revenue: f64,
    pub occupied_spots: i64,
    pub available_spots: i64,
}

#[api_model]
pub struct AdminSummary {
    pub lots: Vec<LotRevenue>,
    pub total_revenue: f64,
    pub total_occupied: i64,
    pub total_available: i64,
}

#[api_model]
pub struct LotUsage {
    pub lot_id: i64,
    pub name: String,
    /// Reservations made in this lot
    pub visits: i64,
    /// Sum of billed stays
    pub spent: f64,
}

#[api_model]
pub struct UserSummary {
    pub lots: Vec<LotUsage>,
    pub total_visits: i64,
    pub total_spent: f64,
}
