use std::future::Future;

use anyhow::Result;

/// Storage key holding the balance as a decimal string.
pub const BALANCE_KEY: &str = "balance";

/// Storage key holding the JSON-encoded transaction list.
pub const TRANSACTIONS_KEY: &str = "transactions";

/// String key-value persistence used to survive process restarts.
///
/// Writes overwrite the whole value for a key. Removing a missing key is not
/// an error.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    fn remove_item(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
