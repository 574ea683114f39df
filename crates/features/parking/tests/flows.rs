use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use vpms_kernel::database::rusqlite::params;
use vpms_kernel::database::{Database, DatabaseError, IN_MEMORY};
use vpms_kernel::domain::config::ApiConfig;
use vpms_kernel::domain::types::UserRole;
use vpms_kernel::server::ApiState;

async fn state() -> ApiState {
    let config = ApiConfig::default();
    let database = Database::builder().path(IN_MEMORY).init().await.expect("database");

    ApiState::builder()
        .config(config.clone())
        .db(database)
        .register_slice(vpms_parking::init(&config).expect("slice"))
        .build()
        .expect("state")
}

/// Inserts an account and opens a session for it; returns the cookie pair.
async fn login_as(state: &ApiState, id: &str, email: &str, role: UserRole) -> String {
    let (id_owned, email_owned) = (id.to_owned(), email.to_owned());
    state
        .database
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, full_name, email, password_hash, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'unused', ?4, ?5, ?5)",
                params![id_owned, format!("Name of {id_owned}"), email_owned, role.as_ref(), Utc::now()],
            )?;
            Ok::<_, DatabaseError>(())
        })
        .await
        .expect("insert user");

    let token = state.sessions.create(id);
    format!("{}={token}", state.config.security.session.cookie_name)
}

async fn admin(state: &ApiState) -> String {
    login_as(state, "@admin", "admin@example.com", UserRole::Admin).await
}

fn app(state: &ApiState) -> Router {
    let (router, _api) = vpms_parking::router().split_for_parts();
    router.with_state(state.clone())
}

async fn send(
    state: &ApiState,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app(state).oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn lot_body(name: &str, location: &str, spots: i64) -> Value {
    json!({
        "name": name,
        "prime_location_name": location,
        "price_per_hour": 50.0,
        "address": "Plot 4, Station Road",
        "pin_code": "411045",
        "maximum_number_of_spots": spots,
    })
}

async fn new_lot(state: &ApiState, admin: &str, location: &str, spots: i64) -> i64 {
    let (status, body) = send(
        state,
        Method::POST,
        "/admin/parking-lot/add",
        Some(admin),
        Some(lot_body(&format!("{location} Plaza"), location, spots)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().expect("lot id")
}

fn car(number: &str) -> Value {
    json!({
        "vehicle_number": number,
        "fuel_type": "petrol",
        "brand": "Maruti",
        "model": "Swift",
        "color": "Red",
    })
}

async fn reserve(state: &ApiState, user: &str, lot: i64, number: &str) -> (StatusCode, Value) {
    send(state, Method::POST, &format!("/user/reserve/{lot}"), Some(user), Some(car(number))).await
}

async fn parked(state: &ApiState, user: &str, lot: i64, number: &str) -> i64 {
    let (status, body) = reserve(state, user, lot, number).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().expect("reservation id")
}

async fn spot_numbers(state: &ApiState, admin: &str, lot: i64) -> Vec<(String, String)> {
    let (status, body) =
        send(state, Method::GET, &format!("/admin/parking-lot/{lot}"), Some(admin), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["spots"]
        .as_array()
        .expect("spots")
        .iter()
        .map(|s| {
            (
                s["spot_number"].as_str().unwrap_or_default().to_owned(),
                s["status"].as_str().unwrap_or_default().to_owned(),
            )
        })
        .collect()
}

#[tokio::test]
async fn new_lot_gets_numbered_available_spots() {
    let state = state().await;
    let admin = admin(&state).await;
    let lot = new_lot(&state, &admin, "Baner", 3).await;

    let spots = spot_numbers(&state, &admin, lot).await;
    let expected: Vec<_> =
        (1..=3).map(|n| (format!("{lot}-{n}"), "AVAILABLE".to_owned())).collect();
    assert_eq!(spots, expected);

    let (_, lots) = send(&state, Method::GET, "/admin/parking-lots", Some(&admin), None).await;
    assert_eq!(lots[0]["available_spots"], 3);
    assert_eq!(lots[0]["occupied_spots"], 0);
}

#[tokio::test]
async fn lot_management_is_admin_only() {
    let state = state().await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;

    let (status, _) = send(
        &state,
        Method::POST,
        "/admin/parking-lot/add",
        Some(&user),
        Some(lot_body("Mall", "Aundh", 2)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send(&state, Method::POST, "/api/parking-lots", None, Some(lot_body("Mall", "Aundh", 2))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&state, Method::GET, "/api/parking-lots", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lot_validation_rejects_bad_capacity_and_hours() {
    let state = state().await;
    let admin = admin(&state).await;

    let (status, _) = send(
        &state,
        Method::POST,
        "/admin/parking-lot/add",
        Some(&admin),
        Some(lot_body("Empty", "Aundh", 0)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = lot_body("Late", "Aundh", 2);
    body["open_time"] = json!("25:00");
    let (status, _) =
        send(&state, Method::POST, "/admin/parking-lot/add", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn reservations_fill_the_lowest_spot_first() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 2).await;

    let (status, first) = reserve(&state, &user, lot, "mh12ab1234").await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["spot_number"], format!("{lot}-1"));
    assert_eq!(first["vehicle_number"], "MH12AB1234");
    assert!(first["leaving_timestamp"].is_null());

    let (status, body) = reserve(&state, &user, lot, "MH12AB1234").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This vehicle is already parked.");

    let (_, second) = reserve(&state, &user, lot, "MH12CD5678").await;
    assert_eq!(second["spot_number"], format!("{lot}-2"));

    let (status, body) = reserve(&state, &user, lot, "MH12EF9012").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "No available spots in this parking lot.");

    let spots = spot_numbers(&state, &admin, lot).await;
    assert!(spots.iter().all(|(_, status)| status == "OCCUPIED"));

    let (_, vehicles) = send(&state, Method::GET, "/api/vehicles", Some(&user), None).await;
    assert_eq!(vehicles.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn inactive_lots_refuse_reservations() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 2).await;

    let (status, body) = send(
        &state,
        Method::PUT,
        &format!("/admin/parking-lot/{lot}/edit"),
        Some(&admin),
        Some(json!({ "price_per_hour": 40.0, "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["price_per_hour"], 40.0);

    let (status, body) = reserve(&state, &user, lot, "MH12AB1234").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This parking lot is not accepting reservations.");
}

#[tokio::test]
async fn release_bills_the_stay_and_frees_the_spot() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 1).await;
    let reservation = parked(&state, &user, lot, "MH12AB1234").await;

    let uri = format!("/user/release/{reservation}");
    let (status, preview) = send(&state, Method::GET, &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["price_per_hour"], 50.0);

    let (status, quote) = send(&state, Method::POST, &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["duration_hours"], 0.01);
    assert_eq!(quote["total_cost"], 0.5);

    let spots = spot_numbers(&state, &admin, lot).await;
    assert_eq!(spots[0].1, "AVAILABLE");

    let (status, body) = send(&state, Method::POST, &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This reservation has already been released.");

    // The freed spot can be taken again.
    parked(&state, &user, lot, "MH12AB1234").await;
}

#[tokio::test]
async fn payment_must_match_the_bill_and_credits_revenue() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 1).await;
    let reservation = parked(&state, &user, lot, "MH12AB1234").await;
    let pay = format!("/user/pay/{reservation}");

    let (status, body) = send(
        &state,
        Method::POST,
        &pay,
        Some(&user),
        Some(json!({ "amount": 0.5, "payment_method": "upi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Release the vehicle before paying.");

    send(&state, Method::POST, &format!("/user/release/{reservation}"), Some(&user), None).await;

    let (status, body) = send(
        &state,
        Method::POST,
        &pay,
        Some(&user),
        Some(json!({ "amount": 5.0, "payment_method": "upi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Payment amount must equal the total cost of 0.50.");

    let (status, payment) = send(
        &state,
        Method::POST,
        &pay,
        Some(&user),
        Some(json!({ "amount": 0.5, "payment_method": "card" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{payment}");
    assert_eq!(payment["amount"], 0.5);
    assert_eq!(payment["payment_method"], "card");

    let (status, _) = send(
        &state,
        Method::POST,
        &pay,
        Some(&user),
        Some(json!({ "amount": 0.5, "payment_method": "upi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, summary) = send(&state, Method::GET, "/admin/summary", Some(&admin), None).await;
    assert_eq!(summary["total_revenue"], 0.5);
    assert_eq!(summary["total_available"], 1);

    let (_, mine) = send(&state, Method::GET, "/user/summary", Some(&user), None).await;
    assert_eq!(mine["total_visits"], 1);
    assert_eq!(mine["total_spent"], 0.5);
    assert_eq!(mine["lots"][0]["lot_id"], lot);
}

#[tokio::test]
async fn reservations_belong_to_their_user() {
    let state = state().await;
    let admin = admin(&state).await;
    let asha = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let ravi = login_as(&state, "@ravi456", "ravi@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 2).await;
    let reservation = parked(&state, &asha, lot, "MH12AB1234").await;

    let (status, _) =
        send(&state, Method::POST, &format!("/user/release/{reservation}"), Some(&ravi), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = reserve(&state, &ravi, lot, "MH12AB1234").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "This vehicle is registered to another user.");

    let (status, _) = send(&state, Method::POST, "/user/release/9999", Some(&ravi), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn occupied_lots_and_spots_cannot_be_deleted() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 2).await;
    let reservation = parked(&state, &user, lot, "MH12AB1234").await;

    let delete = format!("/admin/parking-lot/{lot}/delete");
    let (status, body) = send(&state, Method::POST, &delete, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete a parking lot with occupied spots.");

    let (_, details) =
        send(&state, Method::GET, &format!("/admin/parking-lot/{lot}"), Some(&admin), None).await;
    let occupied = details["spots"][0]["id"].as_i64().expect("spot id");
    let free = details["spots"][1]["id"].as_i64().expect("spot id");

    let (status, _) =
        send(&state, Method::DELETE, &format!("/api/parking-spot/{occupied}"), Some(&admin), None)
            .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        send(&state, Method::DELETE, &format!("/api/parking-spot/{free}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, lot_now) = send(&state, Method::GET, &format!("/api/parking-lot/{lot}"), None, None).await;
    assert_eq!(lot_now["maximum_number_of_spots"], 1);

    send(&state, Method::POST, &format!("/user/release/{reservation}"), Some(&user), None).await;
    let (status, body) = send(&state, Method::POST, &delete, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Parking lot \"Baner Plaza\" and all related spots have been deleted.");

    let (status, _) = send(&state, Method::GET, &format!("/api/parking-lot/{lot}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn capacity_changes_add_and_remove_spots() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 2).await;
    let uri = format!("/api/parking-lot/{lot}");

    let (status, body) = send(
        &state,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "maximum_number_of_spots": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["maximum_number_of_spots"], 4);
    let numbers: Vec<_> =
        spot_numbers(&state, &admin, lot).await.into_iter().map(|(number, _)| number).collect();
    assert_eq!(numbers.last(), Some(&format!("{lot}-4")));

    parked(&state, &user, lot, "MH12AB1234").await;
    let (status, _) = send(
        &state,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "maximum_number_of_spots": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spot_numbers(&state, &admin, lot).await.len(), 1);

    let (status, _) = send(
        &state,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "maximum_number_of_spots": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    parked(&state, &user, lot, "MH12CD5678").await;

    // Spot 2 now has a reservation on record.
    let (status, _) = send(
        &state,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "maximum_number_of_spots": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn dashboard_search_is_kept_until_cleared() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    new_lot(&state, &admin, "Baner", 1).await;
    new_lot(&state, &admin, "Aundh", 1).await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/user/dashboard",
        Some(&user),
        Some(json!({ "location": "baner" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["search_location"], "baner");
    assert_eq!(body["parking_lots"].as_array().map(Vec::len), Some(1));

    let (_, body) = send(&state, Method::GET, "/user/dashboard", Some(&user), None).await;
    assert_eq!(body["parking_lots"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&state, Method::GET, "/user/clear-search", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&state, Method::GET, "/user/dashboard", Some(&user), None).await;
    assert!(body["search_location"].is_null());
    assert_eq!(body["parking_lots"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn admin_search_looks_in_one_field() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 1).await;
    parked(&state, &user, lot, "MH12AB1234").await;

    let (status, body) =
        send(&state, Method::GET, "/admin/search?search_by=location&search_value=BAN", Some(&admin), None)
            .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["parking_lots"][0]["id"], lot);
    assert_eq!(body["users"].as_array().map(Vec::len), Some(0));

    let (_, body) =
        send(&state, Method::GET, "/admin/search?search_by=email&search_value=example", Some(&admin), None)
            .await;
    let users = body["users"].as_array().expect("users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], "@asha123");

    let (_, body) = send(
        &state,
        Method::GET,
        "/admin/search?search_by=vehicle_number&search_value=ab12",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["vehicles"][0]["vehicle_number"], "MH12AB1234");

    let (status, _) =
        send(&state, Method::GET, "/admin/search?search_by=email&search_value=%20", Some(&admin), None)
            .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn vehicles_are_private_to_their_owner() {
    let state = state().await;
    let admin = admin(&state).await;
    let asha = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let ravi = login_as(&state, "@ravi456", "ravi@example.com", UserRole::User).await;

    let (status, vehicle) = send(&state, Method::POST, "/api/vehicles", Some(&asha), Some(car("ka01x1"))).await;
    assert_eq!(status, StatusCode::CREATED, "{vehicle}");
    assert_eq!(vehicle["user_id"], "@asha123");

    let (status, _) = send(&state, Method::POST, "/api/vehicles", Some(&asha), Some(car("KA01X1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut for_ravi = car("KA02Y2");
    for_ravi["user_id"] = json!("@ravi456");
    let (status, _) =
        send(&state, Method::POST, "/api/vehicles", Some(&asha), Some(for_ravi.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&state, Method::POST, "/api/vehicles", Some(&admin), Some(for_ravi)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&state, Method::GET, "/api/vehicle/KA01X1", Some(&ravi), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &state,
        Method::PUT,
        "/api/vehicle/KA01X1",
        Some(&asha),
        Some(json!({ "color": "Blue" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["color"], "Blue");

    let (_, all) = send(&state, Method::GET, "/api/vehicles", Some(&admin), None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (status, body) =
        send(&state, Method::DELETE, "/api/vehicle/KA01X1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vehicle KA01X1 deleted successfully");
}

#[tokio::test]
async fn parked_vehicles_cannot_be_deleted() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 1).await;
    parked(&state, &user, lot, "MH12AB1234").await;

    let (status, body) =
        send(&state, Method::DELETE, "/api/vehicle/MH12AB1234", Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete a vehicle that is currently parked.");
}

#[tokio::test]
async fn spot_status_must_match_its_reservations() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 2).await;
    let reservation = parked(&state, &user, lot, "MH12AB1234").await;

    let (_, details) =
        send(&state, Method::GET, &format!("/admin/parking-lot/{lot}"), Some(&admin), None).await;
    let held = details["spots"][0]["id"].as_i64().expect("held spot");
    let free = details["spots"][1]["id"].as_i64().expect("free spot");
    let held_uri = format!("/api/parking-spot/{held}");
    let free_uri = format!("/api/parking-spot/{free}");

    let (status, _) =
        send(&state, Method::PUT, &held_uri, Some(&user), Some(json!({ "is_covered": true }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&state, Method::PUT, &held_uri, Some(&admin), Some(json!({ "status": "AVAILABLE" }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) =
        send(&state, Method::PUT, &free_uri, Some(&admin), Some(json!({ "status": "OCCUPIED" }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = send(
        &state,
        Method::PUT,
        &held_uri,
        Some(&admin),
        Some(json!({ "is_covered": true, "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "OCCUPIED");

    let (_, spot) = send(&state, Method::GET, &held_uri, None, None).await;
    assert_eq!(spot["is_covered"], true);
    assert_eq!(spot["is_active"], false);

    let (status, _) =
        send(&state, Method::POST, &format!("/user/release/{reservation}"), Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        send(&state, Method::PUT, &held_uri, Some(&admin), Some(json!({ "status": "AVAILABLE" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "AVAILABLE");
}

#[tokio::test]
async fn parked_vehicles_keep_their_owner() {
    let state = state().await;
    let admin = admin(&state).await;
    let user = login_as(&state, "@asha123", "asha@example.com", UserRole::User).await;
    login_as(&state, "@ravi456", "ravi@example.com", UserRole::User).await;
    let lot = new_lot(&state, &admin, "Baner", 1).await;
    parked(&state, &user, lot, "MH12AB1234").await;

    let (status, body) = send(
        &state,
        Method::PUT,
        "/api/vehicle/MH12AB1234",
        Some(&admin),
        Some(json!({ "user_id": "@ravi456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["message"], "Cannot reassign a vehicle that is currently parked.");

    let (_, vehicle) = send(&state, Method::GET, "/api/vehicle/MH12AB1234", Some(&user), None).await;
    assert_eq!(vehicle["user_id"], "@asha123");
}
