pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

// Concurrent wizard sessions share one connection; give writers time to queue.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Opens the reservations database and brings its schema up to date.
// `path` may be ":memory:" for throwaway stores.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open reservations database at {path}"))?;

    // In-memory databases report "memory" and ignore WAL.
    let journal: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .context("failed to set journal mode")?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("failed to enable foreign keys")?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    migrations::run_migrations(&conn)?;
    tracing::debug!(path, journal = %journal, "reservations database ready");

    Ok(conn)
}
