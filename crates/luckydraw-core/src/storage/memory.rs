//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory storage for testing and ephemeral use.
///
/// Clones share the same underlying map, so a test can keep a handle
/// while an engine owns another.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let blobs = self.blobs.read().map_err(|e| {
            StorageError::Other(format!("Lock error: {}", e))
        })?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        let mut blobs = self.blobs.write().map_err(|e| {
            StorageError::Other(format!("Lock error: {}", e))
        })?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut blobs = self.blobs.write().map_err(|e| {
            StorageError::Other(format!("Lock error: {}", e))
        })?;
        blobs.remove(key);
        Ok(())
    }
}
