use crate::model::{ParkingSpot, SpotUpdate};
use crate::repository::{self, reservations, spots};
use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use tracing::info;
use vpms_derive::api_handler;
use vpms_domain::constants::SPOTS_TAG;
use vpms_domain::types::SpotStatus;
use vpms_kernel::server::{AdminUser, ApiError, ApiState, ErrorResponse, MessageResponse};

const SPOT_NOT_FOUND: &str = "Parking spot not found";

#[api_handler(
    get,
    path = "/api/parking-spots",
    responses((status = OK, body = [ParkingSpot])),
    tag = SPOTS_TAG,
)]
pub(super) async fn list_spots(State(state): State<ApiState>) -> Result<Json<Vec<ParkingSpot>>, ApiError> {
    Ok(Json(state.database.call(|conn| spots::list(conn)).await?))
}

#[api_handler(
    get,
    path = "/api/parking-spot/{id}",
    params(("id" = i64, Path, description = "Spot id")),
    responses((status = OK, body = ParkingSpot), (status = NOT_FOUND, body = ErrorResponse)),
    tag = SPOTS_TAG,
)]
pub(super) async fn get_spot(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<ParkingSpot>, ApiError> {
    let found = state.database.call(move |conn| spots::find(conn, id)).await?;
    found.map(Json).ok_or_else(|| ApiError::not_found(SPOT_NOT_FOUND))
}

/// Changes status, cover or the active flag of a spot. The status must agree with
/// whether an active reservation holds the spot.
#[api_handler(
    put,
    path = "/api/parking-spot/{id}",
    params(("id" = i64, Path, description = "Spot id")),
    request_body = SpotUpdate,
    responses(
        (status = OK, body = ParkingSpot),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Status disagrees with the spot's reservations", body = ErrorResponse),
    ),
    tag = SPOTS_TAG,
)]
pub(super) async fn update_spot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<SpotUpdate>,
) -> Result<Json<ParkingSpot>, ApiError> {
    let spot = state
        .database
        .call(move |conn| {
            let Some(mut spot) = spots::find(conn, id)? else {
                return Err(ApiError::not_found(SPOT_NOT_FOUND));
            };
            let held = reservations::spot_is_held(conn, id)?;
            match body.status {
                Some(SpotStatus::Available) if held => {
                    return Err(ApiError::conflict(
                        "Spot is held by an active reservation; release it first.",
                    ));
                }
                Some(SpotStatus::Occupied) if !held => {
                    return Err(ApiError::conflict(
                        "Spots become occupied through a reservation only.",
                    ));
                }
                _ => {}
            }

            spot.status = body.status.unwrap_or(spot.status);
            spot.is_covered = body.is_covered.unwrap_or(spot.is_covered);
            spot.is_active = body.is_active.unwrap_or(spot.is_active);
            spots::update(conn, &spot, Utc::now())?;
            spots::find(conn, id)?.ok_or_else(|| ApiError::not_found(SPOT_NOT_FOUND))
        })
        .await?;

    info!(spot = %spot.spot_number, status = %spot.status, by = %admin.id, "Parking spot updated");
    Ok(Json(spot))
}

/// Removes a free spot and lowers the lot's capacity by one.
#[api_handler(
    delete,
    path = "/api/parking-spot/{id}",
    params(("id" = i64, Path, description = "Spot id")),
    responses(
        (status = OK, body = MessageResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Spot is occupied or is the lot's last spot", body = ErrorResponse),
    ),
    tag = SPOTS_TAG,
)]
pub(super) async fn delete_spot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let spot = state
        .database
        .call(move |conn| {
            let now = Utc::now();
            let tx = repository::begin(conn)?;
            let Some(spot) = spots::find(&tx, id)? else {
                return Err(ApiError::not_found(SPOT_NOT_FOUND));
            };
            if spot.status == SpotStatus::Occupied {
                return Err(ApiError::conflict("Cannot delete an occupied parking spot."));
            }
            let remaining = spots::count(&tx, spot.lot_id)? - 1;
            if remaining < 1 {
                return Err(ApiError::conflict("A parking lot needs at least one spot."));
            }
            spots::delete(&tx, id)?;
            repository::lots::set_capacity(&tx, spot.lot_id, remaining, now)?;
            repository::commit(tx)?;
            Ok(spot)
        })
        .await?;

    info!(spot = %spot.spot_number, lot_id = spot.lot_id, by = %admin.id, "Parking spot deleted");
    Ok(Json(MessageResponse::new("Parking spot deleted successfully")))
}
