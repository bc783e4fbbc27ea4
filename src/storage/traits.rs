use crate::errors::NewsResult;

/// Durable string key-value storage backing the offline cache.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> NewsResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> NewsResult<()>;
    fn remove(&self, key: &str) -> NewsResult<()>;
}
