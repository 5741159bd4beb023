//! SQLite PRAGMA configuration for record store connections.
//! Must be called on every connection immediately after opening.

use rusqlite::Connection;

use adsopt_core::errors::AdsOptResult;

use super::SqlResultExt;

/// Writer PRAGMAs:
/// - WAL so readers proceed during writes
/// - busy_timeout as the lock-contention mechanism; exceeding it surfaces as a
///   transient store error (or a chunk timeout for spend reads)
/// - NORMAL synchronous for the WAL durability trade-off
pub fn configure_connection(conn: &Connection) -> AdsOptResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .op("configure connection")
}

/// Same as `configure_connection` plus `query_only = ON`.
pub fn configure_readonly_connection(conn: &Connection) -> AdsOptResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        PRAGMA query_only = ON;
        ",
    )
    .op("configure read-only connection")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_busy_timeout_and_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn readonly_connection_rejects_writes() {
        let conn = Connection::open_in_memory().unwrap();
        configure_readonly_connection(&conn).unwrap();
        assert!(conn.execute_batch("CREATE TABLE t (x INTEGER)").is_err());
    }
}
