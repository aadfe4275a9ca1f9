use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use super::KeyValueStore;

/// Process-local store. Nothing survives a restart; useful for tests and for
/// running the ledger without a database file.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw values.
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: Mutex::new(
                items
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Raw value for a key, bypassing the async interface.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn with_items_mut<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(f(&mut items))
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_items_mut(|items| items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.with_items_mut(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.with_items_mut(|items| {
            items.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let store = MemoryStore::with_items([("balance", "12.50")]);

        assert_eq!(
            store.get_item("balance").await.unwrap(),
            Some("12.50".to_string())
        );
        store.set_item("transactions", "[]").await.unwrap();
        assert_eq!(store.raw("transactions"), Some("[]".to_string()));

        store.remove_item("balance").await.unwrap();
        assert_eq!(store.get_item("balance").await.unwrap(), None);
    }
}
