//! Hand-written SQL, grouped by table. Functions take a borrowed connection (or an
//! open transaction) so handlers can compose several of them atomically.

pub mod lots;
pub mod reports;
pub mod reservations;
pub mod spots;
pub mod vehicles;

use vpms_database::DatabaseError;
use vpms_database::rusqlite::{Connection, Transaction};

pub fn begin(conn: &mut Connection) -> Result<Transaction<'_>, DatabaseError> {
    Ok(conn.transaction()?)
}

pub fn commit(tx: Transaction<'_>) -> Result<(), DatabaseError> {
    Ok(tx.commit()?)
}

/// `LIKE` pattern matching `needle` anywhere, with `\` escaping wildcards.
#[must_use]
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
