use crate::error::{AppError, Result};
use crate::state::KeyValueStore;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent key-value store using Sled embedded database
#[derive(Clone)]
pub struct SledKvStore {
    db: Arc<Db>,
    tree: sled::Tree,
}

impl SledKvStore {
    /// Open (or create) a Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)
            .map_err(|e| AppError::Storage(format!("Failed to open Sled database: {}", e)))?;

        let tree = db
            .open_tree("listing_search")
            .map_err(|e| AppError::Storage(format!("Failed to open state tree: {}", e)))?;

        tracing::info!("Initialized Sled store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            tree,
        })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

impl KeyValueStore for SledKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .tree
            .get(key.as_bytes())
            .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", key, e)))?;

        match value {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| AppError::Serialization(format!("Stored value for {} is not UTF-8: {}", key, e))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.tree
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))?;
        tracing::debug!(key = %key, bytes = value.len(), "Value persisted");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.tree
            .remove(key.as_bytes())
            .map_err(|e| AppError::Storage(format!("Failed to remove {}: {}", key, e)))?;
        Ok(())
    }
}
