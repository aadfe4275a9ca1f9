pub mod application;
pub mod cli;
pub mod domain;
pub mod settings;
pub mod storage;
pub mod telemetry;

pub use application::LedgerService;
pub use domain::*;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
