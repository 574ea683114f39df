use crate::error::{DatabaseError, DatabaseErrorExt};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, trace};

const VERSION_KEY: &str = "schema_version";

#[derive(Debug)]
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub script: &'static str,
}

/// Ordered schema history. Never edit an applied entry; append a new one.
pub(crate) const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, description: "initial schema", script: V1_INITIAL },
    Migration { version: 2, description: "lookup indexes", script: V2_INDEXES },
];

const V1_INITIAL: &str = r"
CREATE TABLE users (
    id                  TEXT PRIMARY KEY NOT NULL,
    full_name           TEXT NOT NULL,
    email               TEXT NOT NULL UNIQUE,
    password_hash       TEXT NOT NULL,
    phone_number        TEXT UNIQUE,
    address             TEXT NOT NULL DEFAULT '',
    pin_code            TEXT NOT NULL DEFAULT '',
    role                TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
    is_active           INTEGER NOT NULL DEFAULT 1,
    bio                 TEXT,
    date_of_birth       TEXT,
    scheduled_delete_at TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE parking_lots (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    name                    TEXT NOT NULL,
    prime_location_name     TEXT NOT NULL,
    price_per_hour          REAL NOT NULL CHECK (price_per_hour >= 0),
    address                 TEXT NOT NULL,
    pin_code                TEXT NOT NULL,
    floor_level             INTEGER NOT NULL DEFAULT 1 CHECK (floor_level BETWEEN 1 AND 5),
    maximum_number_of_spots INTEGER NOT NULL CHECK (maximum_number_of_spots >= 1),
    revenue                 REAL NOT NULL DEFAULT 0,
    is_active               INTEGER NOT NULL DEFAULT 1,
    open_time               TEXT,
    close_time              TEXT,
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL
);

CREATE TABLE parking_spots (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    spot_number TEXT NOT NULL UNIQUE,
    lot_id      INTEGER NOT NULL REFERENCES parking_lots(id) ON DELETE CASCADE,
    status      TEXT NOT NULL DEFAULT 'AVAILABLE' CHECK (status IN ('AVAILABLE', 'OCCUPIED')),
    is_covered  INTEGER NOT NULL DEFAULT 0,
    revenue     REAL NOT NULL DEFAULT 0,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE vehicles (
    vehicle_number TEXT PRIMARY KEY NOT NULL,
    user_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    fuel_type      TEXT NOT NULL CHECK (fuel_type IN ('petrol', 'diesel', 'electric')),
    brand          TEXT NOT NULL,
    model          TEXT NOT NULL,
    color          TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE reservations (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    spot_id               INTEGER NOT NULL REFERENCES parking_spots(id) ON DELETE CASCADE,
    lot_id                INTEGER NOT NULL REFERENCES parking_lots(id) ON DELETE CASCADE,
    user_id               TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    vehicle_number        TEXT NOT NULL,
    reservation_timestamp TEXT NOT NULL,
    parking_timestamp     TEXT NOT NULL,
    leaving_timestamp     TEXT,
    duration_hours        REAL,
    total_cost            REAL,
    is_paid               INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE payments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    reservation_id INTEGER NOT NULL UNIQUE REFERENCES reservations(id) ON DELETE CASCADE,
    amount         REAL NOT NULL,
    payment_method TEXT NOT NULL,
    paid_at        TEXT NOT NULL
);
";

const V2_INDEXES: &str = r"
CREATE INDEX idx_spots_lot_status ON parking_spots (lot_id, status);
CREATE INDEX idx_reservations_user ON reservations (user_id, reservation_timestamp);
CREATE INDEX idx_reservations_spot ON reservations (spot_id);
CREATE INDEX idx_vehicles_user ON vehicles (user_id);
CREATE INDEX idx_users_scheduled_delete ON users (scheduled_delete_at) WHERE scheduled_delete_at IS NOT NULL;
";

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MigrationReport {
    pub applied: Vec<u32>,
    pub skipped: Vec<u32>,
}

/// Brings the schema up to the newest entry in `migrations`.
///
/// Each script runs in its own transaction together with the version bump.
pub(crate) fn run(
    conn: &mut Connection,
    migrations: &[Migration],
) -> Result<MigrationReport, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_metadata (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)",
        [],
    )
    .context("Creating schema_metadata")?;

    let current = current_version(conn)?;
    let latest = migrations.iter().map(|m| m.version).max().unwrap_or(0);
    if current > latest {
        return Err(DatabaseError::Migration {
            message: format!("database schema version {current} is newer than supported {latest}")
                .into(),
            context: None,
        });
    }

    let mut report = MigrationReport::default();
    for migration in migrations {
        if migration.version <= current {
            trace!(version = migration.version, "Skipping migration");
            report.skipped.push(migration.version);
            continue;
        }

        let tx = conn.transaction().context("Opening migration transaction")?;
        tx.execute_batch(migration.script).map_err(|e| DatabaseError::Migration {
            message: e.to_string().into(),
            context: Some(format!("v{} {}", migration.version, migration.description).into()),
        })?;
        tx.execute(
            "INSERT INTO schema_metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (VERSION_KEY, migration.version.to_string()),
        )
        .context("Recording schema version")?;
        tx.commit().context("Committing migration")?;

        info!(version = migration.version, description = migration.description, "Applied migration");
        report.applied.push(migration.version);
    }

    Ok(report)
}

pub(crate) fn current_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM schema_metadata WHERE key = ?1", [VERSION_KEY], |row| {
            row.get(0)
        })
        .optional()
        .context("Reading schema version")?;

    raw.map_or(Ok(0), |value| {
        value.parse().map_err(|_| DatabaseError::Migration {
            message: format!("invalid schema version: {value}").into(),
            context: None,
        })
    })
}
