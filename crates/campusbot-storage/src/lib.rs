//! Campusbot storage crate - SQLite-backed durable key-value store.
//!
//! Stands in for the browser's local storage: a WAL-mode SQLite database
//! with migrations and a single `kv_store` table.

pub mod db;
pub mod kv;
pub mod migrations;

pub use db::Database;
pub use kv::SqliteKeyValueStore;
