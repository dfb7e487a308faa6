//! Scoped access to the external database.
//!
//! Every operation opens its own connection, uses it, and lets it drop before the
//! response goes out. There is no pool and no connection shared between requests.
//! All of it is blocking, so handlers go through `run_blocking`.

use crate::config::DatabaseConfig;
use crate::error::ApiError;
use log::debug;
use rusqlite::{params, Connection, OpenFlags};
use std::ops::{Deref, DerefMut};

/// A connection that lives for exactly one operation.
///
/// Dropping it closes the underlying handle, so it is released on every exit path,
/// including an early `?` return in the middle of a batch. An open transaction
/// borrowed from it is rolled back first.
pub struct ScopedConnection {
    conn: Connection,
    label: &'static str,
}

impl ScopedConnection {
    pub fn acquire(db: &DatabaseConfig, label: &'static str) -> Result<Self, ApiError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(db.connection_string(), flags)
            .map_err(|e| ApiError::ConnectionUnavailable(e.to_string()))?;
        conn.busy_timeout(db.busy_timeout)
            .map_err(|e| ApiError::ConnectionUnavailable(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("[{}] connection acquired ({})", label, db.name);
        Ok(ScopedConnection { conn, label })
    }
}

impl Deref for ScopedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for ScopedConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        debug!("[{}] connection released", self.label);
    }
}

/// Runs blocking database work off the async worker threads.
pub async fn run_blocking<F, T>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// `SELECT 1` round trip, used by the health check and at startup.
pub fn ping(db: &DatabaseConfig) -> Result<(), ApiError> {
    let conn = ScopedConnection::acquire(db, "ping")?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

/// Whether the configured target table exists. The service never creates it.
pub fn table_exists(db: &DatabaseConfig) -> Result<bool, ApiError> {
    let conn = ScopedConnection::acquire(db, "table_exists")?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![db.table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Quotes an identifier that has already been validated as `[A-Za-z_][A-Za-z0-9_]*`.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}
