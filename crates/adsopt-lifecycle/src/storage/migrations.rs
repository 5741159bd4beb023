//! Schema versioning via a dedicated single-row `schema_version` table.
//! Each version bump is a const SQL string in schema.rs.

use rusqlite::Connection;
use tracing::info;

use adsopt_core::errors::AdsOptResult;

use super::schema::LIFECYCLE_TABLES_V1;
use super::SqlResultExt;

/// Current schema version. Bump when adding a migration.
pub const CURRENT_VERSION: u32 = 1;

pub fn get_schema_version(conn: &Connection) -> AdsOptResult<u32> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .op("read schema version")?;
    if !exists {
        return Ok(0);
    }
    match conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get::<_, u32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(super::store_error("read schema version", e)),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> AdsOptResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL) STRICT;")
        .op("create schema_version")?;
    conn.execute("DELETE FROM schema_version", [])
        .op("clear schema version")?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", rusqlite::params![version])
        .op("write schema version")?;
    Ok(())
}

/// Bring the database up to `CURRENT_VERSION`. Returns the resulting version.
pub fn migrate(conn: &Connection) -> AdsOptResult<u32> {
    let current = get_schema_version(conn)?;
    if current >= CURRENT_VERSION {
        return Ok(current);
    }

    if current < 1 {
        info!("Migrating lifecycle schema: 0 → 1 (initial tables)");
        conn.execute_batch(LIFECYCLE_TABLES_V1).op("migrate to v1")?;
        set_schema_version(conn, 1)?;
    }

    let final_version = get_schema_version(conn)?;
    info!(from = current, to = final_version, "Lifecycle schema migration complete");
    Ok(final_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::LIFECYCLE_TABLE_NAMES;

    #[test]
    fn fresh_database_migrates_to_current() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        assert_eq!(migrate(&conn).unwrap(), CURRENT_VERSION);
        for table in LIFECYCLE_TABLE_NAMES {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {}", table);
        }
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(migrate(&conn).unwrap(), CURRENT_VERSION);
    }
}
