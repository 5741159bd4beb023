//! Reference SQLite record store: connection pool, PRAGMAs, schema migrations,
//! row-level table functions and the engine implementing the store traits.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod pragmas;
pub mod schema;
pub mod tables;

use adsopt_core::errors::AdsOptError;

pub use engine::SqliteRecordStore;
pub use migrations::{migrate, CURRENT_VERSION};
pub use pragmas::{configure_connection, configure_readonly_connection};

/// SQLITE_BUSY / SQLITE_LOCKED: lock contention, worth retrying.
pub fn is_busy_error(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::DatabaseBusy | rusqlite::ffi::ErrorCode::DatabaseLocked,
                ..
            },
            _,
        )
    )
}

pub fn store_error(operation: &str, e: rusqlite::Error) -> AdsOptError {
    AdsOptError::Store {
        operation: operation.to_string(),
        transient: is_busy_error(&e),
        reason: e.to_string(),
    }
}

/// Attach the failing operation's name to a rusqlite error.
pub(crate) trait SqlResultExt<T> {
    fn op(self, operation: &str) -> Result<T, AdsOptError>;
}

impl<T> SqlResultExt<T> for rusqlite::Result<T> {
    fn op(self, operation: &str) -> Result<T, AdsOptError> {
        self.map_err(|e| store_error(operation, e))
    }
}
