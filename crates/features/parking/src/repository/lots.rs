use super::contains_pattern;
use crate::model::{LOT_COLUMNS, LotView, ParkingLot};
use chrono::{DateTime, Utc};
use vpms_database::DatabaseError;
use vpms_database::rusqlite::{Connection, OptionalExtension, Row, params};

/// Validated lot fields, as written to `parking_lots`.
#[derive(Debug, Clone)]
pub struct LotFields {
    pub name: String,
    pub prime_location_name: String,
    pub price_per_hour: f64,
    pub address: String,
    pub pin_code: String,
    pub floor_level: i64,
    pub maximum_number_of_spots: i64,
    pub is_active: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

impl From<&ParkingLot> for LotFields {
    fn from(lot: &ParkingLot) -> Self {
        Self {
            name: lot.name.clone(),
            prime_location_name: lot.prime_location_name.clone(),
            price_per_hour: lot.price_per_hour,
            address: lot.address.clone(),
            pin_code: lot.pin_code.clone(),
            floor_level: lot.floor_level,
            maximum_number_of_spots: lot.maximum_number_of_spots,
            is_active: lot.is_active,
            open_time: lot.open_time.clone(),
            close_time: lot.close_time.clone(),
        }
    }
}

const VIEW_COUNTS: &str = "(SELECT COUNT(*) FROM parking_spots s WHERE s.lot_id = parking_lots.id AND s.status = 'AVAILABLE' AND s.is_active = 1),
     (SELECT COUNT(*) FROM parking_spots s WHERE s.lot_id = parking_lots.id AND s.status = 'OCCUPIED')";

fn view_from_row(row: &Row<'_>) -> vpms_database::rusqlite::Result<LotView> {
    Ok(LotView { lot: ParkingLot::from_row(row)?, available_spots: row.get(14)?, occupied_spots: row.get(15)? })
}

pub fn find(conn: &Connection, id: i64) -> Result<Option<ParkingLot>, DatabaseError> {
    let sql = format!("SELECT {LOT_COLUMNS} FROM parking_lots WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], ParkingLot::from_row).optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<ParkingLot>, DatabaseError> {
    let sql = format!("SELECT {LOT_COLUMNS} FROM parking_lots ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], ParkingLot::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn find_view(conn: &Connection, id: i64) -> Result<Option<LotView>, DatabaseError> {
    let sql = format!("SELECT {LOT_COLUMNS}, {VIEW_COUNTS} FROM parking_lots WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], view_from_row).optional()?)
}

pub fn list_views(conn: &Connection) -> Result<Vec<LotView>, DatabaseError> {
    let sql = format!("SELECT {LOT_COLUMNS}, {VIEW_COUNTS} FROM parking_lots ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], view_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Lots whose name, pin code or prime location contains `needle` (ASCII case-insensitive).
pub fn search_by_location(conn: &Connection, needle: &str) -> Result<Vec<LotView>, DatabaseError> {
    let sql = format!(
        "SELECT {LOT_COLUMNS}, {VIEW_COUNTS} FROM parking_lots
         WHERE name LIKE ?1 ESCAPE '\\' OR pin_code LIKE ?1 ESCAPE '\\'
            OR prime_location_name LIKE ?1 ESCAPE '\\'
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([contains_pattern(needle)], view_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Lots whose pin code contains `needle`.
pub fn search_by_pin_code(conn: &Connection, needle: &str) -> Result<Vec<LotView>, DatabaseError> {
    let sql = format!(
        "SELECT {LOT_COLUMNS}, {VIEW_COUNTS} FROM parking_lots
         WHERE pin_code LIKE ?1 ESCAPE '\\' ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([contains_pattern(needle)], view_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Inserts the lot row only; spots are added with [`super::spots::add_range`].
pub fn insert(conn: &Connection, lot: &LotFields, now: DateTime<Utc>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO parking_lots (name, prime_location_name, price_per_hour, address, pin_code,
             floor_level, maximum_number_of_spots, revenue, is_active, open_time, close_time,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10, ?11, ?11)",
        params![
            lot.name,
            lot.prime_location_name,
            lot.price_per_hour,
            lot.address,
            lot.pin_code,
            lot.floor_level,
            lot.maximum_number_of_spots,
            lot.is_active,
            lot.open_time,
            lot.close_time,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites every editable column.
pub fn update(conn: &Connection, id: i64, lot: &LotFields, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE parking_lots SET name = ?2, prime_location_name = ?3, price_per_hour = ?4,
             address = ?5, pin_code = ?6, floor_level = ?7, maximum_number_of_spots = ?8,
             is_active = ?9, open_time = ?10, close_time = ?11, updated_at = ?12
         WHERE id = ?1",
        params![
            id,
            lot.name,
            lot.prime_location_name,
            lot.price_per_hour,
            lot.address,
            lot.pin_code,
            lot.floor_level,
            lot.maximum_number_of_spots,
            lot.is_active,
            lot.open_time,
            lot.close_time,
            now,
        ],
    )?;
    Ok(changed == 1)
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    Ok(conn.execute("DELETE FROM parking_lots WHERE id = ?1", [id])? == 1)
}

pub fn occupied_spots(conn: &Connection, id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?1 AND status = 'OCCUPIED'",
        [id],
        |r| r.get(0),
    )?)
}

pub fn add_revenue(conn: &Connection, id: i64, amount: f64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE parking_lots SET revenue = ROUND(revenue + ?2, 2), updated_at = ?3 WHERE id = ?1",
        params![id, amount, now],
    )?;
    Ok(())
}

/// Keeps `maximum_number_of_spots` equal to the number of spot rows.
pub fn set_capacity(conn: &Connection, id: i64, capacity: i64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE parking_lots SET maximum_number_of_spots = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, capacity, now],
    )?;
    Ok(())
}
