use crate::model::{Vehicle, VehicleRequest, VehicleUpdate};
use crate::repository::reservations;
use crate::repository::vehicles::{self, VehicleFields, normalize_number};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::{info, warn};
use vpms_derive::api_handler;
use vpms_domain::constants::VEHICLES_TAG;
use vpms_kernel::server::{AdminUser, ApiError, ApiState, CurrentUser, ErrorResponse, MessageResponse};
use vpms_kernel::validation;

const VEHICLE_NOT_FOUND: &str = "Vehicle not found";

/// All vehicles for admins, the caller's own otherwise.
#[api_handler(
    get,
    path = "/api/vehicles",
    responses((status = OK, body = [Vehicle]), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = VEHICLES_TAG,
)]
pub(super) async fn list_vehicles(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let list = state
        .database
        .call(move |conn| {
            if user.is_admin() { vehicles::list(conn) } else { vehicles::of_user(conn, &user.id) }
        })
        .await?;
    Ok(Json(list))
}

#[api_handler(
    post,
    path = "/api/vehicles",
    request_body = VehicleRequest,
    responses(
        (status = CREATED, body = Vehicle),
        (status = BAD_REQUEST, description = "Vehicle already exists", body = ErrorResponse),
        (status = FORBIDDEN, description = "Registering for another user", body = ErrorResponse),
    ),
    tag = VEHICLES_TAG,
)]
pub(super) async fn create_vehicle(
    State(state): State<ApiState>,
    user: CurrentUser,
    Json(body): Json<VehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let owner = body.user_id.as_deref().map_or_else(|| user.id.clone(), |id| id.trim().to_owned());
    if owner != user.id && !user.is_admin() {
        warn!(caller = %user.id, owner = %owner, "Refused to register a vehicle for another user");
        return Err(ApiError::forbidden("You can only register your own vehicle"));
    }
    let fields = VehicleFields {
        vehicle_number: normalize_number(&validation::required("Vehicle number", &body.vehicle_number)?),
        user_id: owner,
        fuel_type: body.fuel_type,
        brand: validation::required("Brand", &body.brand)?,
        model: validation::required("Model", &body.model)?,
        color: validation::required("Color", &body.color)?,
    };

    let vehicle = state
        .database
        .call(move |conn| {
            if vehicles::find(conn, &fields.vehicle_number)?.is_some() {
                return Err(ApiError::bad_request("Vehicle already exists"));
            }
            if !vehicles::user_exists(conn, &fields.user_id)? {
                return Err(ApiError::not_found("User not found"));
            }
            vehicles::insert(conn, &fields, Utc::now())?;
            vehicles::find(conn, &fields.vehicle_number)?
                .ok_or_else(|| ApiError::internal("created vehicle vanished"))
        })
        .await?;

    info!(vehicle = %vehicle.vehicle_number, owner = %vehicle.user_id, "Vehicle registered");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

#[api_handler(
    get,
    path = "/api/vehicle/{number}",
    params(("number" = String, Path, description = "Registration number")),
    responses(
        (status = OK, body = Vehicle),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
    ),
    tag = VEHICLES_TAG,
)]
pub(super) async fn get_vehicle(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(number): Path<String>,
) -> Result<Json<Vehicle>, ApiError> {
    let number = normalize_number(&number);
    let found = state.database.call(move |conn| vehicles::find(conn, &number)).await?;
    let vehicle = found.ok_or_else(|| ApiError::not_found(VEHICLE_NOT_FOUND))?;
    if vehicle.user_id != user.id && !user.is_admin() {
        return Err(ApiError::forbidden("Not authorized to view this vehicle"));
    }
    Ok(Json(vehicle))
}

/// Owners edit details; only admins may hand the vehicle to another user.
#[api_handler(
    put,
    path = "/api/vehicle/{number}",
    params(("number" = String, Path, description = "Registration number")),
    request_body = VehicleUpdate,
    responses(
        (status = OK, body = Vehicle),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Reassigning a parked vehicle", body = ErrorResponse),
    ),
    tag = VEHICLES_TAG,
)]
pub(super) async fn update_vehicle(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(number): Path<String>,
    Json(body): Json<VehicleUpdate>,
) -> Result<Json<Vehicle>, ApiError> {
    let number = normalize_number(&number);
    let text = |field: &str, v: Option<String>| v.map(|v| validation::required(field, &v)).transpose();
    let brand = text("Brand", body.brand)?;
    let model = text("Model", body.model)?;
    let color = text("Color", body.color)?;
    let new_owner = body.user_id.map(|id| id.trim().to_owned());

    let caller = user.clone();
    let vehicle = state
        .database
        .call(move |conn| {
            let Some(current) = vehicles::find(conn, &number)? else {
                return Err(ApiError::not_found(VEHICLE_NOT_FOUND));
            };
            if current.user_id != caller.id && !caller.is_admin() {
                return Err(ApiError::forbidden("Not authorized to update this vehicle"));
            }
            let owner = match new_owner {
                Some(owner) if owner != current.user_id => {
                    if !caller.is_admin() {
                        return Err(ApiError::forbidden("Only admins can reassign a vehicle."));
                    }
                    if !vehicles::user_exists(conn, &owner)? {
                        return Err(ApiError::not_found("User not found"));
                    }
                    if reservations::vehicle_is_parked(conn, &current.vehicle_number)? {
                        return Err(ApiError::conflict(
                            "Cannot reassign a vehicle that is currently parked.",
                        ));
                    }
                    owner
                }
                _ => current.user_id,
            };

            let fields = VehicleFields {
                vehicle_number: current.vehicle_number,
                user_id: owner,
                fuel_type: body.fuel_type.unwrap_or(current.fuel_type),
                brand: brand.unwrap_or(current.brand),
                model: model.unwrap_or(current.model),
                color: color.unwrap_or(current.color),
            };
            vehicles::update(conn, &fields, Utc::now())?;
            vehicles::find(conn, &fields.vehicle_number)?
                .ok_or_else(|| ApiError::not_found(VEHICLE_NOT_FOUND))
        })
        .await?;

    info!(vehicle = %vehicle.vehicle_number, owner = %vehicle.user_id, by = %user.id, "Vehicle updated");
    Ok(Json(vehicle))
}

#[api_handler(
    delete,
    path = "/api/vehicle/{number}",
    params(("number" = String, Path, description = "Registration number")),
    responses(
        (status = OK, body = MessageResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Vehicle is parked", body = ErrorResponse),
    ),
    tag = VEHICLES_TAG,
)]
pub(super) async fn delete_vehicle(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(number): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let number = normalize_number(&number);
    let target = number.clone();
    state
        .database
        .call(move |conn| {
            if vehicles::find(conn, &target)?.is_none() {
                return Err(ApiError::not_found(VEHICLE_NOT_FOUND));
            }
            if reservations::vehicle_is_parked(conn, &target)? {
                return Err(ApiError::conflict("Cannot delete a vehicle that is currently parked."));
            }
            vehicles::delete(conn, &target)?;
            Ok(())
        })
        .await?;

    info!(vehicle = %number, by = %admin.id, "Vehicle deleted");
    Ok(Json(MessageResponse::new(format!("Vehicle {number} deleted successfully"))))
}
