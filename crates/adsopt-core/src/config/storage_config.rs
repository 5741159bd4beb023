use serde::{Deserialize, Serialize};

/// Reference SQLite record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file. `None` opens an in-memory store.
    pub db_path: Option<String>,
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            read_pool_size: 2,
        }
    }
}
