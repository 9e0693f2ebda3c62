pub mod config;
pub mod error;
pub mod kv;
pub mod types;

pub use config::CampusbotConfig;
pub use error::{CampusbotError, Result};
pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use types::*;
