// Application layer - the ledger state manager and read-only reporting
// built on top of the domain types and a key-value store.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use service::*;
