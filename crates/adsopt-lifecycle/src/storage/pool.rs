//! ConnectionPool: writer + read pool with round-robin selection.
//!
//! The only place in this crate that holds `Mutex<Connection>`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use adsopt_core::errors::{AdsOptError, AdsOptResult};

use super::{configure_connection, configure_readonly_connection, SqlResultExt};

const DEFAULT_READ_POOL_SIZE: usize = 2;

/// 1 writer + N readers. WAL on every connection.
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
}

impl ConnectionPool {
    /// Open a file-backed pool. The writer must be opened (and the schema
    /// migrated by the caller) before readers see any tables.
    pub fn open(path: &Path, read_pool_size: usize) -> AdsOptResult<Self> {
        let pool_size = if read_pool_size == 0 {
            DEFAULT_READ_POOL_SIZE
        } else {
            read_pool_size
        };

        let writer = Connection::open(path).op("open writer")?;
        configure_connection(&writer)?;

        let mut readers = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .op("open reader")?;
            configure_readonly_connection(&reader)?;
            readers.push(Mutex::new(reader));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
        })
    }

    /// In-memory pool. Separate in-memory connections don't share data, so
    /// there are no readers and reads go through the writer.
    pub fn open_in_memory() -> AdsOptResult<Self> {
        let writer = Connection::open_in_memory().op("open in-memory writer")?;
        configure_connection(&writer)?;
        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    pub fn with_writer<F, T>(&self, f: F) -> AdsOptResult<T>
    where
        F: FnOnce(&mut Connection) -> AdsOptResult<T>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| AdsOptError::store("lock writer", e.to_string()))?;
        f(&mut conn)
    }

    /// Round-robin reader; falls back to the writer when there are no readers.
    pub fn with_reader<F, T>(&self, f: F) -> AdsOptResult<T>
    where
        F: FnOnce(&Connection) -> AdsOptResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(|conn| f(conn));
        }
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index]
            .lock()
            .map_err(|e| AdsOptError::store("lock reader", e.to_string()))?;
        f(&conn)
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn is_wal_mode(&self) -> bool {
        self.with_reader(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_default();
            Ok(mode.eq_ignore_ascii_case("wal"))
        })
        .unwrap_or(false)
    }
}
