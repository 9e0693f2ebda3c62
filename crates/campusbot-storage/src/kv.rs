//! SQLite implementation of [`KeyValueStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use campusbot_core::error::{CampusbotError, Result};
use campusbot_core::kv::KeyValueStore;

use crate::db::Database;

/// Durable key-value store in the `kv_store` table.
#[derive(Debug)]
pub struct SqliteKeyValueStore {
    db: Database,
}

impl SqliteKeyValueStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::new(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::in_memory()?))
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CampusbotError::Storage(format!("Failed to read key {}: {}", key, e)))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, Utc::now().timestamp()],
            )
            .map_err(|e| CampusbotError::Storage(format!("Failed to write key {}: {}", key, e)))?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .map_err(|e| {
                    CampusbotError::Storage(format!("Failed to delete key {}: {}", key, e))
                })?;
            Ok(())
        })
    }
}
