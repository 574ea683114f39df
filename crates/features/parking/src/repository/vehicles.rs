use crate::model::{VEHICLE_COLUMNS, Vehicle};
use chrono::{DateTime, Utc};
use vpms_database::DatabaseError;
use vpms_database::rusqlite::{Connection, OptionalExtension, params};
use vpms_domain::types::FuelType;

/// Fields of a vehicle row other than its timestamps.
#[derive(Debug, Clone)]
pub struct VehicleFields {
    pub vehicle_number: String,
    pub user_id: String,
    pub fuel_type: FuelType,
    pub brand: String,
    pub model: String,
    pub color: String,
}

/// Registration numbers are stored trimmed and upper-cased.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn find(conn: &Connection, number: &str) -> Result<Option<Vehicle>, DatabaseError> {
    let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE vehicle_number = ?1");
    Ok(conn.query_row(&sql, [number], Vehicle::from_row).optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<Vehicle>, DatabaseError> {
    let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY vehicle_number");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], Vehicle::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn of_user(conn: &Connection, user_id: &str) -> Result<Vec<Vehicle>, DatabaseError> {
    let sql =
        format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE user_id = ?1 ORDER BY vehicle_number");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([user_id], Vehicle::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Vehicles whose number contains `needle`.
pub fn search(conn: &Connection, needle: &str) -> Result<Vec<Vehicle>, DatabaseError> {
    let sql = format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE vehicle_number LIKE ?1 ESCAPE '\\'
         ORDER BY vehicle_number"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([super::contains_pattern(needle)], Vehicle::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn insert(conn: &Connection, vehicle: &VehicleFields, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vehicles (vehicle_number, user_id, fuel_type, brand, model, color, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            vehicle.vehicle_number,
            vehicle.user_id,
            vehicle.fuel_type.as_ref(),
            vehicle.brand,
            vehicle.model,
            vehicle.color,
            now,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, vehicle: &VehicleFields, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE vehicles SET user_id = ?2, fuel_type = ?3, brand = ?4, model = ?5, color = ?6,
             updated_at = ?7
         WHERE vehicle_number = ?1",
        params![
            vehicle.vehicle_number,
            vehicle.user_id,
            vehicle.fuel_type.as_ref(),
            vehicle.brand,
            vehicle.model,
            vehicle.color,
            now,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, number: &str) -> Result<bool, DatabaseError> {
    Ok(conn.execute("DELETE FROM vehicles WHERE vehicle_number = ?1", [number])? == 1)
}

pub fn user_exists(conn: &Connection, user_id: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", [user_id], |r| {
        r.get(0)
    })?)
}
