use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Durable string key-value storage used for filter state, history and presets.
///
/// Calls are synchronous so pending state can still be written from `Drop`.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; missing keys are not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store (for tests and storage-less sessions)
#[derive(Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        tracing::trace!(key = %key, "Value stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
