use super::{LOT_NOT_FOUND, check_price, clock, delete_unoccupied_lot, insert_lot_with_spots, lot_fields};
use crate::model::{
    AdminSearchQuery, AdminSummary, LotDetails, LotRequest, LotSettings, LotView, SearchResults,
};
use crate::repository::lots::LotFields;
use crate::repository::{lots, reports, spots, vehicles};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::info;
use vpms_derive::api_handler;
use vpms_domain::constants::{ADMIN_TAG, LOTS_TAG};
use vpms_domain::types::SearchField;
use vpms_kernel::server::{AdminUser, ApiError, ApiState, ErrorResponse, MessageResponse};
use vpms_kernel::validation;

/// Every lot with its available and occupied spot counts.
#[api_handler(
    get,
    path = "/admin/parking-lots",
    responses((status = OK, body = [LotView]), (status = FORBIDDEN, body = ErrorResponse)),
    tag = LOTS_TAG,
)]
pub(super) async fn list_lots(
    State(state): State<ApiState>,
    _admin: AdminUser,
) -> Result<Json<Vec<LotView>>, ApiError> {
    Ok(Json(state.database.call(|conn| lots::list_views(conn)).await?))
}

#[api_handler(
    get,
    path = "/admin/parking-lot/{id}",
    params(("id" = i64, Path, description = "Lot id")),
    responses((status = OK, body = LotDetails), (status = NOT_FOUND, body = ErrorResponse)),
    tag = LOTS_TAG,
)]
pub(super) async fn lot_details(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<LotDetails>, ApiError> {
    let details = state
        .database
        .call(move |conn| {
            let Some(lot) = lots::find_view(conn, id)? else {
                return Err(ApiError::not_found(LOT_NOT_FOUND));
            };
            Ok(LotDetails { lot, spots: spots::of_lot(conn, id)? })
        })
        .await?;
    Ok(Json(details))
}

/// Creates a lot together with its spots.
#[api_handler(
    post,
    path = "/admin/parking-lot/add",
    request_body = LotRequest,
    responses(
        (status = CREATED, body = LotView),
        (status = UNPROCESSABLE_ENTITY, body = ErrorResponse),
    ),
    tag = LOTS_TAG,
)]
pub(super) async fn add_lot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<LotRequest>,
) -> Result<(StatusCode, Json<LotView>), ApiError> {
    let fields = lot_fields(body)?;
    let view = state.database.call(move |conn| insert_lot_with_spots(conn, &fields, Utc::now())).await?;

    info!(lot_id = view.lot.id, name = %view.lot.name, by = %admin.id, "Parking lot created");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Changes price, hours and the active flag. Location and capacity stay as they are.
#[api_handler(
    put,
    path = "/admin/parking-lot/{id}/edit",
    params(("id" = i64, Path, description = "Lot id")),
    request_body = LotSettings,
    responses(
        (status = OK, body = LotView),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, body = ErrorResponse),
    ),
    tag = LOTS_TAG,
)]
pub(super) async fn edit_lot(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<LotSettings>,
) -> Result<Json<LotView>, ApiError> {
    let price = check_price(body.price_per_hour)?;
    let open_time = clock("Open time", body.open_time.as_deref())?;
    let close_time = clock("Close time", body.close_time.as_deref())?;

    let view = state
        .database
        .call(move |conn| {
            let Some(lot) = lots::find(conn, id)? else {
                return Err(ApiError::not_found(LOT_NOT_FOUND));
            };
            let fields = LotFields {
                price_per_hour: price,
                open_time,
                close_time,
                is_active: body.is_active,
                ..LotFields::from(&lot)
            };
            lots::update(conn, id, &fields, Utc::now())?;
            lots::find_view(conn, id)?.ok_or_else(|| ApiError::not_found(LOT_NOT_FOUND))
        })
        .await?;

    info!(lot_id = id, name = %view.lot.name, by = %admin.id, "Parking lot updated");
    Ok(Json(view))
}

/// Deletes a lot and its spots. Refused while any spot is occupied.
#[api_handler(
    post,
    path = "/admin/parking-lot/{id}/delete",
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
    Ok(Json(MessageResponse::new(format!(
        "Parking lot \"{}\" and all related spots have been deleted.",
        lot.name
    ))))
}

/// Finds users, lots or vehicles by one field (case-insensitive substring).
#[api_handler(
    get,
    path = "/admin/search",
    params(AdminSearchQuery),
    responses((status = OK, body = SearchResults), (status = UNPROCESSABLE_ENTITY, body = ErrorResponse)),
    tag = ADMIN_TAG,
)]
pub(super) async fn search(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Query(query): Query<AdminSearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let value = validation::required("Search value", &query.search_value)?;
    let field = query.search_by;

    let results = state
        .database
        .call(move |conn| {
            let mut results = SearchResults {
                search_by: field,
                search_value: value.clone(),
                users: Vec::new(),
                parking_lots: Vec::new(),
                vehicles: Vec::new(),
            };
            match field {
                SearchField::Location => results.parking_lots = lots::search_by_location(conn, &value)?,
                SearchField::PinCode => results.parking_lots = lots::search_by_pin_code(conn, &value)?,
                SearchField::VehicleNumber => results.vehicles = vehicles::search(conn, &value)?,
                SearchField::UserId
                | SearchField::FullName
                | SearchField::Email
                | SearchField::PhoneNumber => {
                    results.users = reports::search_users(conn, field, &value)?;
                }
            }
            Ok::<_, ApiError>(results)
        })
        .await?;

    Ok(Json(results))
}

/// Revenue and occupancy per lot, for the admin charts.
#[api_handler(
    get,
    path = "/admin/summary",
    responses((status = OK, body = AdminSummary), (status = FORBIDDEN, body = ErrorResponse)),
    tag = ADMIN_TAG,
)]
pub(super) async fn summary(
    State(state): State<ApiState>,
    _admin: AdminUser,
) -> Result<Json<AdminSummary>, ApiError> {
    Ok(Json(state.database.call(|conn| reports::admin_summary(conn)).await?))
}
