mod admin;
mod lots;
mod spots;
mod user;
mod vehicles;

use crate::Parking;
use crate::billing::BillingPolicy;
use crate::model::{CLOCK_FORMAT, LotRequest, LotView, ParkingLot};
use crate::repository::lots::LotFields;
use crate::repository::{self, spots as spot_store};
use chrono::{DateTime, Utc};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use vpms_database::rusqlite::Connection;
use vpms_domain::constants::{MAX_FLOOR_LEVEL, MAX_SPOTS_PER_LOT, MIN_FLOOR_LEVEL};
use vpms_kernel::server::{ApiError, ApiState};
use vpms_kernel::validation;

/// Every parking route: admin pages, the `/api` resources and the user flows.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(admin::list_lots))
        .routes(routes!(admin::lot_details))
        .routes(routes!(admin::add_lot))
        .routes(routes!(admin::edit_lot))
        .routes(routes!(admin::delete_lot))
        .routes(routes!(admin::search))
        .routes(routes!(admin::summary))
        .routes(routes!(lots::list_lots, lots::create_lot))
        .routes(routes!(lots::get_lot, lots::update_lot, lots::delete_lot))
        .routes(routes!(spots::list_spots))
        .routes(routes!(spots::get_spot, spots::update_spot, spots::delete_spot))
        .routes(routes!(vehicles::list_vehicles, vehicles::create_vehicle))
        .routes(routes!(vehicles::get_vehicle, vehicles::update_vehicle, vehicles::delete_vehicle))
        .routes(routes!(user::dashboard, user::search_lots))
        .routes(routes!(user::clear_search))
        .routes(routes!(user::reserve))
        .routes(routes!(user::release_preview, user::release))
        .routes(routes!(user::pay))
        .routes(routes!(user::summary))
}

const LOT_NOT_FOUND: &str = "Parking lot not found";

fn billing_policy(state: &ApiState) -> Result<BillingPolicy, ApiError> {
    state
        .try_get_slice::<Parking>()
        .map(|slice| slice.billing)
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Normalizes an optional `HH:MM` value; blank means unset.
fn clock(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(validation::clock_time(field, v)?.format(CLOCK_FORMAT).to_string())),
        None => Ok(None),
    }
}

fn check_price(value: f64) -> Result<f64, ApiError> {
    validation::amount("Price per hour", value)
}

fn check_floor(value: i64) -> Result<i64, ApiError> {
    validation::range("Floor level", value, MIN_FLOOR_LEVEL, MAX_FLOOR_LEVEL)
}

fn check_capacity(value: i64) -> Result<i64, ApiError> {
    validation::range("Maximum number of spots", value, 1, MAX_SPOTS_PER_LOT)
}

fn lot_fields(body: LotRequest) -> Result<LotFields, ApiError> {
    Ok(LotFields {
        name: validation::required("Name", &body.name)?,
        prime_location_name: validation::required("Prime location name", &body.prime_location_name)?,
        price_per_hour: check_price(body.price_per_hour)?,
        address: validation::required("Address", &body.address)?,
        pin_code: validation::required("Pin code", &body.pin_code)?,
        floor_level: check_floor(body.floor_level.unwrap_or(MIN_FLOOR_LEVEL))?,
        maximum_number_of_spots: check_capacity(body.maximum_number_of_spots)?,
        is_active: body.is_active.unwrap_or(true),
        open_time: clock("Open time", body.open_time.as_deref())?,
        close_time: clock("Close time", body.close_time.as_deref())?,
    })
}

/// Inserts the lot and its spots `{id}-1..={id}-N` in one transaction.
fn insert_lot_with_spots(conn: &mut Connection, fields: &LotFields, now: DateTime<Utc>) -> Result<LotView, ApiError> {
    let tx = repository::begin(conn)?;
    let id = repository::lots::insert(&tx, fields, now)?;
    spot_store::add_range(&tx, id, 1, fields.maximum_number_of_spots, now)?;
    let view = repository::lots::find_view(&tx, id)?
        .ok_or_else(|| ApiError::internal("created lot vanished"))?;
    repository::commit(tx)?;
    Ok(view)
}

/// Deletes a lot and its spots unless a spot is occupied.
fn delete_unoccupied_lot(conn: &Connection, id: i64) -> Result<ParkingLot, ApiError> {
    let lot = repository::lots::find(conn, id)?.ok_or_else(|| ApiError::not_found(LOT_NOT_FOUND))?;
    if repository::lots::occupied_spots(conn, id)? > 0 {
        return Err(ApiError::conflict("Cannot delete a parking lot with occupied spots."));
    }
    repository::lots::delete(conn, id)?;
    Ok(lot)
}

/// Grows or shrinks the lot to `target` spots.
///
/// Growing appends spots after the highest spot number. Shrinking removes the
/// highest-numbered spots and requires each of them to be available and never
/// reserved.
fn resize(conn: &Connection, lot_id: i64, target: i64, now: DateTime<Utc>) -> Result<(), ApiError> {
    let current = spot_store::count(conn, lot_id)?;
    if target > current {
        let next = spot_store::highest_ordinal(conn, lot_id)? + 1;
        spot_store::add_range(conn, lot_id, next, next + (target - current) - 1, now)?;
    } else if target < current {
        let spots = spot_store::of_lot(conn, lot_id)?;
        let surplus = usize::try_from(current - target).unwrap_or_default();
        for spot in spots.iter().rev().take(surplus) {
            if spot.status == vpms_domain::types::SpotStatus::Occupied
                || spot_store::has_history(conn, spot.id)?
            {
                return Err(ApiError::conflict(format!(
                    "Cannot shrink the parking lot: spot {} is occupied or has reservations.",
                    spot.spot_number
                )));
            }
            spot_store::delete(conn, spot.id)?;
        }
    }
    repository::lots::set_capacity(conn, lot_id, target, now)?;
    Ok(())
}
