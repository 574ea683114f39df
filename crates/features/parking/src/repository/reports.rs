//! Read-only queries behind the admin search and the chart summaries.

use super::contains_pattern;
use crate::billing::round2;
use crate::model::{AdminSummary, LotRevenue, LotUsage, UserMatch, UserSummary};
use vpms_database::DatabaseError;
use vpms_database::rusqlite::Connection;
use vpms_domain::types::SearchField;

/// Regular accounts whose `field` contains `needle`. Lot and vehicle fields match
/// no users.
pub fn search_users(
    conn: &Connection,
    field: SearchField,
    needle: &str,
) -> Result<Vec<UserMatch>, DatabaseError> {
    let column = match field {
        SearchField::UserId => "id",
        SearchField::FullName => "full_name",
        SearchField::Email => "email",
        SearchField::PhoneNumber => "phone_number",
        SearchField::Location | SearchField::VehicleNumber | SearchField::PinCode => {
            return Ok(Vec::new());
        }
    };

    let sql = format!(
        "SELECT id, full_name, email, phone_number, is_active FROM users
         WHERE role = 'user' AND {column} LIKE ?1 ESCAPE '\\' ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([contains_pattern(needle)], |r| {
        Ok(UserMatch {
            id: r.get(0)?,
            full_name: r.get(1)?,
            email: r.get(2)?,
            phone_number: r.get(3)?,
            is_active: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn admin_summary(conn: &Connection) -> Result<AdminSummary, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.name, l.revenue,
             (SELECT COUNT(*) FROM parking_spots s WHERE s.lot_id = l.id AND s.status = 'OCCUPIED'),
             (SELECT COUNT(*) FROM parking_spots s WHERE s.lot_id = l.id AND s.status = 'AVAILABLE')
         FROM parking_lots l ORDER BY l.id",
    )?;
    let lots = stmt
        .query_map([], |r| {
            Ok(LotRevenue {
                lot_id: r.get(0)?,
                name: r.get(1)?,
                revenue: r.get(2)?,
                occupied_spots: r.get(3)?,
                available_spots: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AdminSummary {
        total_revenue: round2(lots.iter().map(|l| l.revenue).sum()),
        total_occupied: lots.iter().map(|l| l.occupied_spots).sum(),
        total_available: lots.iter().map(|l| l.available_spots).sum(),
        lots,
    })
}

/// Per-lot visits and billed totals for one user.
pub fn user_summary(conn: &Connection, user_id: &str) -> Result<UserSummary, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.name, COUNT(r.id), COALESCE(SUM(r.total_cost), 0.0)
         FROM reservations r JOIN parking_lots l ON l.id = r.lot_id
         WHERE r.user_id = ?1
         GROUP BY l.id, l.name ORDER BY l.id",
    )?;
    let lots = stmt
        .query_map([user_id], |r| {
            Ok(LotUsage {
                lot_id: r.get(0)?,
                name: r.get(1)?,
                visits: r.get(2)?,
                spent: round2(r.get(3)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UserSummary {
        total_visits: lots.iter().map(|l| l.visits).sum(),
        total_spent: round2(lots.iter().map(|l| l.spent).sum()),
        lots,
    })
}
