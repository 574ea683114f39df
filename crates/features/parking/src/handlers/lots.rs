use super::{
    LOT_NOT_FOUND, check_capacity, check_floor, check_price, clock, insert_lot_with_spots,
    delete_unoccupied_lot, lot_fields, resize,
};
use crate::model::{LotPatch, LotRequest, ParkingLot};
use crate::repository::{self, lots::LotFields};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::info;
use vpms_derive::api_handler;
use vpms_domain::constants::LOTS_TAG;
use vpms_kernel::server::{AdminUser, ApiError, ApiState, ErrorResponse, MessageResponse};
use vpms_kernel::validation;

#[api_handler(
    get,
    path = "/api/parking-lots",
    responses((status = OK, body = [ParkingLot])),
    tag = LOTS_TAG,
)]
pub(super) async fn list_lots(State(state): State<ApiState>) -> Result<Json<Vec<ParkingLot>>, ApiError> {
    Ok(Json(state.database.call(|conn| repository::lots::list(conn)).await?))
}

#[api_handler(
    post,
    path = "/api/parking-lots",
    request_body = LotRequest,
    responses(
        (status = CREATED, body = ParkingLot),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, body = ErrorResponse),
    ),
    tag = LOTS_TAG,
)]
pub(super) async fn create_lot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<LotRequest>,
) -> Result<(StatusCode, Json<ParkingLot>), ApiError> {
    let fields = lot_fields(body)?;
    let view = state.database.call(move |conn| insert_lot_with_spots(conn, &fields, Utc::now())).await?;

    info!(lot_id = view.lot.id, name = %view.lot.name, by = %admin.id, "Parking lot created");
    Ok((StatusCode::CREATED, Json(view.lot)))
}

#[api_handler(
    get,
    path = "/api/parking-lot/{id}",
    params(("id" = i64, Path, description = "Lot id")),
    responses((status = OK, body = ParkingLot), (status = NOT_FOUND, body = ErrorResponse)),
    tag = LOTS_TAG,
)]
pub(super) async fn get_lot(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<ParkingLot>, ApiError> {
    let found = state.database.call(move |conn| repository::lots::find(conn, id)).await?;
    found.map(Json).ok_or_else(|| ApiError::not_found(LOT_NOT_FOUND))
}

/// Partial update. A new `maximum_number_of_spots` adds spots, or removes the
/// highest-numbered ones when they are free and were never reserved.
#[api_handler(
    put,
    path = "/api/parking-lot/{id}",
    params(("id" = i64, Path, description = "Lot id")),
    request_body = LotPatch,
    responses(
        (status = OK, body = ParkingLot),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Spots to remove are in use", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, body = ErrorResponse),
    ),
    tag = LOTS_TAG,
)]
pub(super) async fn update_lot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(patch): Json<LotPatch>,
) -> Result<Json<ParkingLot>, ApiError> {
    let checked = CheckedPatch::try_from(patch)?;

    let lot = state
        .database
        .call(move |conn| {
            let now = Utc::now();
            let tx = repository::begin(conn)?;
            let Some(current) = repository::lots::find(&tx, id)? else {
                return Err(ApiError::not_found(LOT_NOT_FOUND));
            };

            let fields = checked.apply(LotFields::from(&current));
            if fields.maximum_number_of_spots != current.maximum_number_of_spots {
                resize(&tx, id, fields.maximum_number_of_spots, now)?;
            }
            repository::lots::update(&tx, id, &fields, now)?;
            let updated = repository::lots::find(&tx, id)?
                .ok_or_else(|| ApiError::not_found(LOT_NOT_FOUND))?;
            repository::commit(tx)?;
            Ok(updated)
        })
        .await?;

    info!(lot_id = id, by = %admin.id, spots = lot.maximum_number_of_spots, "Parking lot updated");
    Ok(Json(lot))
}

#[api_handler(
    delete,
    path = "/api/parking-lot/{id}",
    params(("id" = i64, Path, description = "Lot id")),
    responses(
        (status = OK, body = MessageResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Lot has occupied spots", body = ErrorResponse),
    ),
    tag = LOTS_TAG,
)]
pub(super) async fn delete_lot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let lot = state.database.call(move |conn| delete_unoccupied_lot(conn, id)).await?;

    info!(lot_id = id, name = %lot.name, by = %admin.id, "Parking lot deleted");
    Ok(Json(MessageResponse::new("Parking lot deleted successfully")))
}

/// A [`LotPatch`] whose present fields passed validation.
#[derive(Debug)]
struct CheckedPatch {
    name: Option<String>,
    prime_location_name: Option<String>,
    price_per_hour: Option<f64>,
    address: Option<String>,
    pin_code: Option<String>,
    floor_level: Option<i64>,
    maximum_number_of_spots: Option<i64>,
    is_active: Option<bool>,
    open_time: Option<Option<String>>,
    close_time: Option<Option<String>>,
}

impl TryFrom<LotPatch> for CheckedPatch {
    type Error = ApiError;

    fn try_from(patch: LotPatch) -> Result<Self, Self::Error> {
        let text = |field: &str, v: Option<String>| {
            v.map(|v| validation::required(field, &v)).transpose()
        };
        Ok(Self {
            name: text("Name", patch.name)?,
            prime_location_name: text("Prime location name", patch.prime_location_name)?,
            price_per_hour: patch.price_per_hour.map(check_price).transpose()?,
            address: text("Address", patch.address)?,
            pin_code: text("Pin code", patch.pin_code)?,
            floor_level: patch.floor_level.map(check_floor).transpose()?,
            maximum_number_of_spots: patch.maximum_number_of_spots.map(check_capacity).transpose()?,
            is_active: patch.is_active,
            open_time: patch.open_time.map(|v| clock("Open time", Some(v.as_str()))).transpose()?,
            close_time: patch.close_time.map(|v| clock("Close time", Some(v.as_str()))).transpose()?,
        })
    }
}

impl CheckedPatch {
    fn apply(self, current: LotFields) -> LotFields {
        LotFields {
            name: self.name.unwrap_or(current.name),
            prime_location_name: self.prime_location_name.unwrap_or(current.prime_location_name),
            price_per_hour: self.price_per_hour.unwrap_or(current.price_per_hour),
            address: self.address.unwrap_or(current.address),
            pin_code: self.pin_code.unwrap_or(current.pin_code),
            floor_level: self.floor_level.unwrap_or(current.floor_level),
            maximum_number_of_spots: self
                .maximum_number_of_spots
                .unwrap_or(current.maximum_number_of_spots),
            is_active: self.is_active.unwrap_or(current.is_active),
            open_time: self.open_time.unwrap_or(current.open_time),
            close_time: self.close_time.unwrap_or(current.close_time),
        }
    }
}
