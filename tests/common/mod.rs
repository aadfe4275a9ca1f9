// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use meusgastos::application::{LedgerService, LoadReport};
use meusgastos::storage::{KeyValueStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

pub const FALLBACK_CATEGORY: &str = "Outros";

/// Helper to create a test service over a fresh temporary database.
/// Returns the database path so tests can reopen it.
pub async fn test_service() -> Result<(LedgerService<SqliteStore>, TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let (service, _) = reopen(&db_path).await?;
    Ok((service, temp_dir, db_path))
}

/// Open a new service over an existing database file, as a restart would.
pub async fn reopen(db_path: &Path) -> Result<(LedgerService<SqliteStore>, LoadReport)> {
    let store = SqliteStore::open(db_path.to_str().unwrap()).await?;
    Ok(LedgerService::open(store, FALLBACK_CATEGORY).await)
}

/// Helper to create a service over an in-memory store seeded with raw values.
pub async fn seeded_service(
    balance: Option<&str>,
    transactions: Option<&str>,
) -> (LedgerService<MemoryStore>, LoadReport) {
    let mut items = Vec::new();
    if let Some(balance) = balance {
        items.push(("balance", balance));
    }
    if let Some(transactions) = transactions {
        items.push(("transactions", transactions));
    }
    LedgerService::open(MemoryStore::with_items(items), FALLBACK_CATEGORY).await
}

/// Store wrapper whose reads and writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.raw(key)
    }
}

impl KeyValueStore for FlakyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("simulated read failure for '{}'", key);
        }
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated write failure for '{}'", key);
        }
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated remove failure for '{}'", key);
        }
        self.inner.remove_item(key).await
    }
}
