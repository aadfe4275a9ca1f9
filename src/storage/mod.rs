mod kv;
mod memory;
pub mod records;
mod sqlite;

pub use kv::*;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// SQL migration for the key-value table
pub const MIGRATION_001_KV_STORE: &str = include_str!("migrations/001_kv_store.sql");
