//! # Database Infrastructure
//!
//! A single `SQLite` connection shared by every feature slice.
//!
//! ## Key Features
//! - **One writer**: the connection sits behind a mutex, so multi-row updates
//!   (reserve, release, pay) are serialized and run inside one transaction.
//! - **Off the reactor**: [`Database::call`] executes closures on Tokio's
//!   blocking pool.
//! - **Versioned schema**: migrations are applied on startup and recorded in
//!   `schema_metadata`.
//!
//! ## Example
//!
//! ```rust
//! use vpms_database::{Database, DatabaseError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder().path(":memory:").init().await?;
//!     db.health().await?;
//!
//!     let lots: i64 = db
//!         .call(|conn| Ok::<_, DatabaseError>(conn.query_row("SELECT COUNT(*) FROM parking_lots", [], |r| r.get(0))?))
//!         .await?;
//!     assert_eq!(lots, 0);
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use rusqlite;

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Path understood as "no file, keep everything in memory".
pub const IN_MEMORY: &str = ":memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    conn: Mutex<Connection>,
    path: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(path = %self.path, "SQLite connection closed");
    }
}

/// Cloneable handle to the shared `SQLite` connection.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Location the handle was opened from (`:memory:` for in-memory databases).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Runs `f` against the connection on the blocking pool.
    ///
    /// The closure holds the connection lock for its whole body, so anything it
    /// does inside `conn.transaction()` is atomic with respect to other calls.
    ///
    /// # Errors
    /// Whatever `f` returns, or [`DatabaseError::Internal`] (converted into `E`)
    /// if the blocking task panicked or was cancelled.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut conn = inner.conn.lock();
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            E::from(DatabaseError::Internal {
                message: e.to_string().into(),
                context: Some("Blocking database task failed".into()),
            })
        })?
    }

    /// Cheap liveness probe (`SELECT 1`).
    ///
    /// # Errors
    /// [`DatabaseError::Connection`] if the statement fails.
    pub async fn health(&self) -> Result<(), DatabaseError> {
        self.call(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map(|_| ()).map_err(|e| {
                DatabaseError::Connection {
                    message: e.to_string().into(),
                    context: Some("Health check".into()),
                }
            })
        })
        .await
    }

    /// Schema version recorded by the migration runner.
    ///
    /// # Errors
    /// [`DatabaseError::Migration`] if the stored version is unreadable.
    pub async fn schema_version(&self) -> Result<u32, DatabaseError> {
        self.call(|conn| migrations::current_version(conn)).await
    }
}

/// A fluent builder for opening the `SQLite` database.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    path: Option<String>,
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database file path, or [`IN_MEMORY`].
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Opens the database, applies pragmas and migrations.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if no path was provided.
    /// * [`DatabaseError::Connection`] if the file or its directory cannot be created.
    /// * [`DatabaseError::Migration`] if the schema cannot be brought up to date.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let path = self
            .path
            .filter(|p| !p.trim().is_empty())
            .ok_or(DatabaseError::Validation { message: "Path is required".into(), context: None })?;

        let opened = path.clone();
        let conn = tokio::task::spawn_blocking(move || open(&opened))
            .await
            .map_err(|e| DatabaseError::Internal {
                message: e.to_string().into(),
                context: Some("Opening database".into()),
            })??;

        info!(path = %path, "SQLite database ready");
        Ok(Database { inner: Arc::new(DatabaseInner { conn: Mutex::new(conn), path }) })
    }
}

fn open(path: &str) -> Result<Connection, DatabaseError> {
    let mut conn = if path == IN_MEMORY {
        Connection::open_in_memory()
    } else {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Connection {
                message: e.to_string().into(),
                context: Some(format!("Creating {}", parent.display()).into()),
            })?;
        }
        Connection::open(path)
    }
    .map_err(|e| DatabaseError::Connection {
        message: e.to_string().into(),
        context: Some(path.to_owned().into()),
    })?;

    conn.busy_timeout(BUSY_TIMEOUT).context("Setting busy timeout")?;
    conn.pragma_update(None, "foreign_keys", "ON").context("Enabling foreign keys")?;
    if path != IN_MEMORY {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("Enabling WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL").context("Setting synchronous")?;
        debug!(journal_mode = %mode, "Journal mode set");
    }

    info!("Applying database migrations...");
    let report = migrations::run(&mut conn, migrations::MIGRATIONS)?;
    debug!(applied = ?report.applied, skipped = ?report.skipped, "Database migrations finished");

    Ok(conn)
}
