//! Versioned schema migrations.
//!
//! # Invariants
//! - Migration versions increase monotonically; `PRAGMA user_version`
//!   records the highest applied one.
//! - All pending migrations apply inside a single transaction.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Highest migration version this build knows.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Brings the connection's schema up to [`latest_version`].
///
/// A database stamped with a newer version than this build supports is
/// refused rather than partially interpreted.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let applied: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();

    if applied > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: applied,
            latest_supported: latest,
        });
    }

    if applied < latest {
        let tx = conn.transaction()?;
        for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > applied) {
            tx.execute_batch(sql)?;
            tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
        }
        tx.commit()?;
    }

    Ok(())
}
