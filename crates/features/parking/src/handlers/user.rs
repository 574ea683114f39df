use super::{LOT_NOT_FOUND, billing_policy};
use crate::billing::{BillingPolicy, Quote, is_open};
use crate::model::{
    Dashboard, Payment, PaymentRequest, ReleaseQuote, ReserveRequest, Reservation, SearchRequest,
    UserSummary,
};
use crate::repository::vehicles::{VehicleFields, normalize_number};
use crate::repository::{self, lots, reports, reservations, spots, vehicles};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};
use vpms_database::rusqlite::Connection;
use vpms_derive::api_handler;
use vpms_domain::constants::{DASHBOARD_TAG, RESERVATIONS_TAG};
use vpms_domain::types::SpotStatus;
use vpms_kernel::server::{ApiError, ApiState, CurrentUser, ErrorResponse, MessageResponse};
use vpms_kernel::validation;

fn dashboard_for(
    conn: &Connection,
    user_id: &str,
    search_location: Option<String>,
) -> Result<Dashboard, ApiError> {
    let parking_lots = match search_location.as_deref() {
        Some(location) => lots::search_by_location(conn, location)?,
        None => lots::list_views(conn)?,
    };
    Ok(Dashboard { search_location, parking_lots, reservations: reservations::of_user(conn, user_id)? })
}

/// Loads a reservation and checks the caller owns it.
fn owned_reservation(conn: &Connection, id: i64, user_id: &str) -> Result<Reservation, ApiError> {
    let reservation =
        reservations::find(conn, id)?.ok_or_else(|| ApiError::not_found("Reservation not found"))?;
    if reservation.user_id != user_id {
        warn!(reservation_id = id, caller = %user_id, "Access to another user's reservation");
        return Err(ApiError::forbidden("You can only manage your own reservations."));
    }
    Ok(reservation)
}

/// Lots (filtered by the saved search, if any) and the caller's reservations.
#[api_handler(
    get,
    path = "/user/dashboard",
    responses((status = OK, body = Dashboard), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = DASHBOARD_TAG,
)]
pub(super) async fn dashboard(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = state
        .database
        .call(move |conn| dashboard_for(conn, &user.id, user.search_location))
        .await?;
    Ok(Json(dashboard))
}

/// Saves a location search in the session and returns the filtered dashboard.
#[api_handler(
    post,
    path = "/user/dashboard",
    request_body = SearchRequest,
    responses((status = OK, body = Dashboard), (status = UNPROCESSABLE_ENTITY, body = ErrorResponse)),
    tag = DASHBOARD_TAG,
)]
pub(super) async fn search_lots(
    State(state): State<ApiState>,
    user: CurrentUser,
    Json(body): Json<SearchRequest>,
) -> Result<Json<Dashboard>, ApiError> {
    let location = validation::required("Location", &body.location)?;
    state.sessions.set_search_location(&user.token, Some(location.clone()));

    let dashboard =
        state.database.call(move |conn| dashboard_for(conn, &user.id, Some(location))).await?;
    Ok(Json(dashboard))
}

#[api_handler(
    get,
    path = "/user/clear-search",
    responses((status = OK, body = MessageResponse)),
    tag = DASHBOARD_TAG,
)]
pub(super) async fn clear_search(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Json<MessageResponse> {
    state.sessions.set_search_location(&user.token, None);
    info!(user_id = %user.id, "Dashboard search cleared");
    Json(MessageResponse::new("Search cleared."))
}

/// Parks a vehicle in the lowest free spot of the lot.
///
/// An unknown vehicle is registered to the caller on the way.
#[api_handler(
    post,
    path = "/user/reserve/{lot_id}",
    params(("lot_id" = i64, Path, description = "Lot id")),
    request_body = ReserveRequest,
    responses(
        (status = CREATED, body = Reservation),
        (status = FORBIDDEN, description = "Vehicle belongs to another user", body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Lot full, closed or inactive, or vehicle already parked", body = ErrorResponse),
    ),
    tag = RESERVATIONS_TAG,
)]
pub(super) async fn reserve(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(lot_id): Path<i64>,
    Json(body): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let vehicle = VehicleFields {
        vehicle_number: normalize_number(&validation::required("Vehicle number", &body.vehicle_number)?),
        user_id: user.id.clone(),
        fuel_type: body.fuel_type,
        brand: validation::required("Brand", &body.brand)?,
        model: validation::required("Model", &body.model)?,
        color: validation::required("Color", &body.color)?,
    };
    let local_time = Local::now().time();

    let reservation = state
        .database
        .call(move |conn| {
            let now = Utc::now();
            let tx = repository::begin(conn)?;

            let lot = lots::find(&tx, lot_id)?.ok_or_else(|| ApiError::not_found(LOT_NOT_FOUND))?;
            if !lot.is_active {
                return Err(ApiError::conflict("This parking lot is not accepting reservations."));
            }
            let (open, close) = lot.hours();
            if !is_open(open, close, local_time) {
                return Err(ApiError::conflict("This parking lot is closed right now."));
            }

            match vehicles::find(&tx, &vehicle.vehicle_number)? {
                Some(existing) if existing.user_id != vehicle.user_id => {
                    return Err(ApiError::forbidden("This vehicle is registered to another user."));
                }
                Some(_) => {}
                None => vehicles::insert(&tx, &vehicle, now)?,
            }
            if reservations::vehicle_is_parked(&tx, &vehicle.vehicle_number)? {
                return Err(ApiError::conflict("This vehicle is already parked."));
            }

            let spot = spots::first_available(&tx, lot_id)?
                .ok_or_else(|| ApiError::conflict("No available spots in this parking lot."))?;
            spots::set_status(&tx, spot.id, SpotStatus::Occupied, now)?;
            let id = reservations::insert(
                &tx,
                &reservations::NewReservation {
                    spot_id: spot.id,
                    lot_id,
                    user_id: &vehicle.user_id,
                    vehicle_number: &vehicle.vehicle_number,
                    at: now,
                },
            )?;
            let reservation = reservations::find(&tx, id)?
                .ok_or_else(|| ApiError::internal("created reservation vanished"))?;
            repository::commit(tx)?;
            Ok(reservation)
        })
        .await?;

    info!(
        reservation_id = reservation.id,
        user_id = %reservation.user_id,
        spot = %reservation.spot_number,
        vehicle = %reservation.vehicle_number,
        "Spot reserved"
    );
    Ok((StatusCode::CREATED, Json(reservation)))
}

fn quote_for(
    conn: &Connection,
    reservation: &Reservation,
    policy: BillingPolicy,
    left_at: DateTime<Utc>,
) -> Result<ReleaseQuote, ApiError> {
    let lot = lots::find(conn, reservation.lot_id)?.ok_or_else(|| ApiError::not_found(LOT_NOT_FOUND))?;
    let quote = policy.quote(reservation.parking_timestamp, left_at, lot.price_per_hour);
    Ok(ReleaseQuote {
        reservation_id: reservation.id,
        vehicle_number: reservation.vehicle_number.clone(),
        spot_number: reservation.spot_number.clone(),
        lot_name: reservation.lot_name.clone(),
        parking_timestamp: reservation.parking_timestamp,
        leaving_timestamp: left_at,
        duration_hours: quote.duration_hours,
        price_per_hour: lot.price_per_hour,
        total_cost: quote.total_cost,
    })
}

/// What releasing now would cost. Changes nothing.
#[api_handler(
    get,
    path = "/user/release/{reservation_id}",
    params(("reservation_id" = i64, Path, description = "Reservation id")),
    responses(
        (status = OK, body = ReleaseQuote),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Already released", body = ErrorResponse),
    ),
    tag = RESERVATIONS_TAG,
)]
pub(super) async fn release_preview(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(reservation_id): Path<i64>,
) -> Result<Json<ReleaseQuote>, ApiError> {
    let policy = billing_policy(&state)?;
    let quote = state
        .database
        .call(move |conn| {
            let reservation = owned_reservation(conn, reservation_id, &user.id)?;
            if !reservation.is_active() {
                return Err(ApiError::conflict("This reservation has already been released."));
            }
            quote_for(conn, &reservation, policy, Utc::now())
        })
        .await?;
    Ok(Json(quote))
}

/// Ends the stay: bills it and frees the spot.
#[api_handler(
    post,
    path = "/user/release/{reservation_id}",
    params(("reservation_id" = i64, Path, description = "Reservation id")),
    responses(
        (status = OK, body = ReleaseQuote),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Already released", body = ErrorResponse),
    ),
    tag = RESERVATIONS_TAG,
)]
pub(super) async fn release(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(reservation_id): Path<i64>,
) -> Result<Json<ReleaseQuote>, ApiError> {
    let policy = billing_policy(&state)?;
    let user_id = user.id.clone();
    let quote = state
        .database
        .call(move |conn| {
            let now = Utc::now();
            let tx = repository::begin(conn)?;
            let reservation = owned_reservation(&tx, reservation_id, &user_id)?;
            if !reservation.is_active() {
                return Err(ApiError::conflict("This reservation has already been released."));
            }

            let quote = quote_for(&tx, &reservation, policy, now)?;
            reservations::release(
                &tx,
                reservation_id,
                now,
                Quote { duration_hours: quote.duration_hours, total_cost: quote.total_cost },
            )?;
            spots::set_status(&tx, reservation.spot_id, SpotStatus::Available, now)?;
            repository::commit(tx)?;
            Ok(quote)
        })
        .await?;

    info!(
        reservation_id,
        user_id = %user.id,
        spot = %quote.spot_number,
        hours = quote.duration_hours,
        cost = quote.total_cost,
        "Vehicle released"
    );
    Ok(Json(quote))
}

/// Pays a released reservation. The amount must equal the bill.
#[api_handler(
    post,
    path = "/user/pay/{reservation_id}",
    params(("reservation_id" = i64, Path, description = "Reservation id")),
    request_body = PaymentRequest,
    responses(
        (status = OK, body = Payment),
        (status = FORBIDDEN, body = ErrorResponse),
        (status = NOT_FOUND, body = ErrorResponse),
        (status = CONFLICT, description = "Not released yet or already paid", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Amount differs from the bill", body = ErrorResponse),
    ),
    tag = RESERVATIONS_TAG,
)]
pub(super) async fn pay(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(reservation_id): Path<i64>,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    let policy = billing_policy(&state)?;
    let amount = validation::amount("Amount", body.amount)?;
    let method = body.payment_method;
    let user_id = user.id.clone();

    let payment = state
        .database
        .call(move |conn| {
            let now = Utc::now();
            let tx = repository::begin(conn)?;
            let reservation = owned_reservation(&tx, reservation_id, &user_id)?;
            let Some(total_cost) = reservation.total_cost.filter(|_| !reservation.is_active()) else {
                return Err(ApiError::conflict("Release the vehicle before paying."));
            };
            if reservation.is_paid {
                return Err(ApiError::conflict("This reservation is already paid."));
            }
            if !policy.accepts_payment(amount, total_cost) {
                return Err(ApiError::validation(format!(
                    "Payment amount must equal the total cost of {total_cost:.2}."
                )));
            }

            let payment = reservations::record_payment(&tx, reservation_id, total_cost, method, now)?;
            lots::add_revenue(&tx, reservation.lot_id, total_cost, now)?;
            spots::add_revenue(&tx, reservation.spot_id, total_cost, now)?;
            repository::commit(tx)?;
            Ok(payment)
        })
        .await?;

    info!(
        reservation_id,
        user_id = %user.id,
        amount = payment.amount,
        method = %payment.payment_method,
        "Payment received"
    );
    Ok(Json(payment))
}

/// Visits and spend per lot for the caller, for the user charts.
#[api_handler(
    get,
    path = "/user/summary",
    responses((status = OK, body = UserSummary), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = DASHBOARD_TAG,
)]
pub(super) async fn summary(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<UserSummary>, ApiError> {
    Ok(Json(state.database.call(move |conn| reports::user_summary(conn, &user.id)).await?))
}
