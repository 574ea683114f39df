use crate::billing::Quote;
use crate::model::{Payment, RESERVATION_SELECT, Reservation};
use chrono::{DateTime, Utc};
use vpms_database::DatabaseError;
use vpms_database::rusqlite::{Connection, OptionalExtension, params};
use vpms_domain::types::PaymentMethod;

pub fn find(conn: &Connection, id: i64) -> Result<Option<Reservation>, DatabaseError> {
    let sql = format!("{RESERVATION_SELECT} WHERE r.id = ?1");
    Ok(conn.query_row(&sql, [id], Reservation::from_row).optional()?)
}

/// The user's reservations, newest first.
pub fn of_user(conn: &Connection, user_id: &str) -> Result<Vec<Reservation>, DatabaseError> {
    let sql =
        format!("{RESERVATION_SELECT} WHERE r.user_id = ?1 ORDER BY r.reservation_timestamp DESC, r.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([user_id], Reservation::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Whether the vehicle currently occupies a spot.
pub fn vehicle_is_parked(conn: &Connection, number: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reservations WHERE vehicle_number = ?1 AND leaving_timestamp IS NULL)",
        [number],
        |r| r.get(0),
    )?)
}

/// Whether an unreleased reservation holds the spot.
pub fn spot_is_held(conn: &Connection, spot_id: i64) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reservations WHERE spot_id = ?1 AND leaving_timestamp IS NULL)",
        [spot_id],
        |r| r.get(0),
    )?)
}

#[derive(Debug, Clone)]
pub struct NewReservation<'a> {
    pub spot_id: i64,
    pub lot_id: i64,
    pub user_id: &'a str,
    pub vehicle_number: &'a str,
    pub at: DateTime<Utc>,
}

/// Reserves and parks at the same instant. Returns the new id.
pub fn insert(conn: &Connection, new: &NewReservation<'_>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO reservations (spot_id, lot_id, user_id, vehicle_number, reservation_timestamp,
             parking_timestamp, is_paid)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0)",
        params![new.spot_id, new.lot_id, new.user_id, new.vehicle_number, new.at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn release(
    conn: &Connection,
    id: i64,
    left_at: DateTime<Utc>,
    quote: Quote,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE reservations SET leaving_timestamp = ?2, duration_hours = ?3, total_cost = ?4
         WHERE id = ?1 AND leaving_timestamp IS NULL",
        params![id, left_at, quote.duration_hours, quote.total_cost],
    )?;
    Ok(())
}

/// Marks the reservation paid and records the payment.
pub fn record_payment(
    conn: &Connection,
    reservation_id: i64,
    amount: f64,
    method: PaymentMethod,
    now: DateTime<Utc>,
) -> Result<Payment, DatabaseError> {
    conn.execute("UPDATE reservations SET is_paid = 1 WHERE id = ?1", [reservation_id])?;
    conn.execute(
        "INSERT INTO payments (reservation_id, amount, payment_method, paid_at) VALUES (?1, ?2, ?3, ?4)",
        params![reservation_id, amount, method.as_ref(), now],
    )?;
    Ok(Payment {
        id: conn.last_insert_rowid(),
        reservation_id,
        amount,
        payment_method: method,
        paid_at: now,
    })
}
