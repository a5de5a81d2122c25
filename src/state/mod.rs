pub mod cache;
pub mod history;
pub mod sled_store;
pub mod store;

pub use cache::*;
pub use history::{FilterPresets, SearchHistory};
pub use sled_store::SledKvStore;
pub use store::*;

use crate::config::StorageConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the durable store described by the storage configuration
pub fn create_kv_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match &config.path {
        Some(path) => Ok(Arc::new(SledKvStore::new(path)?)),
        None => {
            tracing::info!("No storage path configured, using in-memory store");
            Ok(Arc::new(InMemoryKvStore::new()))
        }
    }
}
