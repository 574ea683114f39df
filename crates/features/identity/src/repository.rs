//! SQL for the `users` table. Every function takes a borrowed connection so callers
//! can compose them inside one [`Database::call`](vpms_database::Database::call).

use crate::model::{AdminUserRow, NewUser, USER_COLUMNS, User, UserView};
use chrono::{DateTime, NaiveDate, Utc};
use vpms_database::DatabaseError;
use vpms_database::rusqlite::{Connection, OptionalExtension, params};
use vpms_domain::types::UserRole;

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], User::from_row).optional()?)
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    Ok(conn.query_row(&sql, [email], User::from_row).optional()?)
}

pub fn id_exists(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", [id], |r| r.get(0))?)
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)", [email], |r| {
        r.get(0)
    })?)
}

/// Whether `phone` belongs to an account other than `except_id`.
pub fn phone_taken(
    conn: &Connection,
    phone: &str,
    except_id: Option<&str>,
) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE phone_number = ?1 AND id IS NOT ?2)",
        params![phone, except_id],
        |r| r.get(0),
    )?)
}

pub fn admin_exists(conn: &Connection) -> Result<bool, DatabaseError> {
    Ok(conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')", [], |r| {
        r.get(0)
    })?)
}

pub fn insert(conn: &Connection, user: &NewUser, now: DateTime<Utc>) -> Result<User, DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, full_name, email, password_hash, phone_number, address, pin_code,
             role, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)",
        params![
            user.id,
            user.full_name,
            user.email,
            user.password_hash,
            user.phone_number,
            user.address,
            user.pin_code,
            user.role.as_ref(),
            now,
        ],
    )?;
    find_by_id(conn, &user.id)?.ok_or_else(|| "inserted user vanished".into())
}

pub fn list_by_role(conn: &Connection, role: UserRole) -> Result<Vec<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY created_at, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([role.as_ref()], User::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Regular accounts with their vehicle and reservation counts.
pub fn admin_overview(conn: &Connection) -> Result<Vec<AdminUserRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT
             (SELECT COUNT(*) FROM vehicles v WHERE v.user_id = ?1),
             (SELECT COUNT(*) FROM reservations r WHERE r.user_id = ?1),
             (SELECT COUNT(*) FROM reservations r WHERE r.user_id = ?1 AND r.leaving_timestamp IS NULL)",
    )?;

    list_by_role(conn, UserRole::User)?
        .into_iter()
        .map(|user| -> Result<AdminUserRow, DatabaseError> {
            let (vehicles, reservations, active_reservations) =
                stmt.query_row([&user.id], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
            Ok(AdminUserRow { user: UserView::from(user), vehicles, reservations, active_reservations })
        })
        .collect()
}

pub fn update_profile(
    conn: &Connection,
    id: &str,
    full_name: &str,
    bio: Option<&str>,
    date_of_birth: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET full_name = ?2, bio = ?3, date_of_birth = ?4, updated_at = ?5 WHERE id = ?1",
        params![id, full_name, bio, date_of_birth, now],
    )?;
    Ok(changed == 1)
}

/// Contact details edited through the users resource.
#[derive(Debug)]
pub struct AccountChanges<'a> {
    pub full_name: &'a str,
    pub phone_number: Option<&'a str>,
    pub address: &'a str,
    pub pin_code: &'a str,
    pub password_hash: Option<&'a str>,
}

pub fn update_account(
    conn: &Connection,
    id: &str,
    changes: &AccountChanges<'_>,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET full_name = ?2, phone_number = ?3, address = ?4, pin_code = ?5,
             password_hash = COALESCE(?6, password_hash), updated_at = ?7
         WHERE id = ?1",
        params![
            id,
            changes.full_name,
            changes.phone_number,
            changes.address,
            changes.pin_code,
            changes.password_hash,
            now
        ],
    )?;
    Ok(changed == 1)
}

/// Deactivates the account until `at`, after which it gets purged.
pub fn schedule_deletion(
    conn: &Connection,
    id: &str,
    at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET is_active = 0, scheduled_delete_at = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, at, now],
    )?;
    Ok(changed == 1)
}

pub fn cancel_deletion(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET is_active = 1, scheduled_delete_at = NULL, updated_at = ?2 WHERE id = ?1",
        params![id, now],
    )?;
    Ok(changed == 1)
}

pub fn delete(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? == 1)
}

pub fn has_active_reservation(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = ?1 AND leaving_timestamp IS NULL)",
        [id],
        |r| r.get(0),
    )?)
}

/// Frees the spots of `id`'s open reservations; the reservation rows go with the
/// account through the cascade.
fn release_held_spots(conn: &Connection, id: &str) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "UPDATE parking_spots SET status = 'AVAILABLE'
         WHERE id IN (SELECT spot_id FROM reservations WHERE user_id = ?1 AND leaving_timestamp IS NULL)",
        [id],
    )?)
}

/// Deletes soft-deleted accounts whose grace period ended at or before `now`,
/// freeing any spot they still hold. Returns the removed ids.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, scheduled_delete_at FROM users
         WHERE is_active = 0 AND scheduled_delete_at IS NOT NULL",
    )?;
    let expired = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, DateTime<Utc>>(1)?)))?
        .filter_map(|row| match row {
            Ok((id, at)) if at <= now => Some(Ok(id)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    for id in &expired {
        release_held_spots(conn, id)?;
        conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    }
    Ok(expired)
}
