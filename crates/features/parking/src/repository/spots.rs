use crate::model::{ParkingSpot, SPOT_COLUMNS, spot_ordinal};
use chrono::{DateTime, Utc};
use vpms_database::DatabaseError;
use vpms_database::rusqlite::{Connection, OptionalExtension, params};
use vpms_domain::types::SpotStatus;

pub fn find(conn: &Connection, id: i64) -> Result<Option<ParkingSpot>, DatabaseError> {
    let sql = format!("SELECT {SPOT_COLUMNS} FROM parking_spots WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], ParkingSpot::from_row).optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<ParkingSpot>, DatabaseError> {
    let sql = format!("SELECT {SPOT_COLUMNS} FROM parking_spots ORDER BY lot_id, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], ParkingSpot::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Spots of one lot in spot-number order.
pub fn of_lot(conn: &Connection, lot_id: i64) -> Result<Vec<ParkingSpot>, DatabaseError> {
    let sql = format!("SELECT {SPOT_COLUMNS} FROM parking_spots WHERE lot_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut spots = stmt
        .query_map([lot_id], ParkingSpot::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    spots.sort_by_key(|s| (s.ordinal().unwrap_or(i64::MAX), s.id));
    Ok(spots)
}

/// Creates spots `{lot_id}-{first}` through `{lot_id}-{last}`, all available.
pub fn add_range(
    conn: &Connection,
    lot_id: i64,
    first: i64,
    last: i64,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO parking_spots (spot_number, lot_id, status, is_covered, revenue, is_active,
             created_at, updated_at)
         VALUES (?1, ?2, 'AVAILABLE', 0, 0, 1, ?3, ?3)",
    )?;
    for n in first..=last {
        stmt.execute(params![format!("{lot_id}-{n}"), lot_id, now])?;
    }
    Ok(())
}

/// Highest `n` used by a spot of the lot, 0 when it has none.
pub fn highest_ordinal(conn: &Connection, lot_id: i64) -> Result<i64, DatabaseError> {
    let mut stmt = conn.prepare("SELECT spot_number FROM parking_spots WHERE lot_id = ?1")?;
    let numbers = stmt.query_map([lot_id], |r| r.get::<_, String>(0))?;
    let mut highest = 0;
    for number in numbers {
        highest = highest.max(spot_ordinal(&number?).unwrap_or(0));
    }
    Ok(highest)
}

/// Lowest-id spot of the lot that is active and available.
pub fn first_available(conn: &Connection, lot_id: i64) -> Result<Option<ParkingSpot>, DatabaseError> {
    let sql = format!(
        "SELECT {SPOT_COLUMNS} FROM parking_spots
         WHERE lot_id = ?1 AND status = 'AVAILABLE' AND is_active = 1
         ORDER BY id LIMIT 1"
    );
    Ok(conn.query_row(&sql, [lot_id], ParkingSpot::from_row).optional()?)
}

pub fn set_status(
    conn: &Connection,
    id: i64,
    status: SpotStatus,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE parking_spots SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, status.as_ref(), now],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, spot: &ParkingSpot, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE parking_spots SET status = ?2, is_covered = ?3, is_active = ?4, updated_at = ?5
         WHERE id = ?1",
        params![spot.id, spot.status.as_ref(), spot.is_covered, spot.is_active, now],
    )?;
    Ok(())
}

pub fn add_revenue(conn: &Connection, id: i64, amount: f64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE parking_spots SET revenue = ROUND(revenue + ?2, 2), updated_at = ?3 WHERE id = ?1",
        params![id, amount, now],
    )?;
    Ok(())
}

/// Whether any reservation, past or present, references the spot.
pub fn has_history(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reservations WHERE spot_id = ?1)",
        [id],
        |r| r.get(0),
    )?)
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    Ok(conn.execute("DELETE FROM parking_spots WHERE id = ?1", [id])? == 1)
}

pub fn count(conn: &Connection, lot_id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?1", [lot_id], |r| {
        r.get(0)
    })?)
}
