use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Contract for the key-value backends the app persists into.
///
/// The progress store keeps its whole state as one JSON document under a
/// single key, so three operations cover everything. A missing key is not
/// an error; `read` reports it as `None`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` and its value. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory adapter for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let store = InMemoryStore::new();
        store.write("progress", "{}").await.unwrap();
        assert_eq!(store.read("progress").await.unwrap(), Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_read_missing_key_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.read("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_replaces_previous_value() {
        let store = InMemoryStore::new();
        store.write("progress", "old").await.unwrap();
        store.write("progress", "new").await.unwrap();
        assert_eq!(
            store.read("progress").await.unwrap(),
            Some("new".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_removes_value() {
        let store = InMemoryStore::new();
        store.write("progress", "{}").await.unwrap();
        store.delete("progress").await.unwrap();
        assert_eq!(store.read("progress").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let store = InMemoryStore::new();
        assert!(store.delete("absent").await.is_ok());
    }
}
