//! Storage abstraction for session persistence.

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use autosave::{AutoSaver, DEFAULT_STORAGE_KEY, LoadError, create_default_storage};
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value store for serialized session blobs.
///
/// Implementations can keep blobs in memory, in files, or in the
/// browser's local storage. Calls are synchronous and may fail; callers
/// decide whether a failure matters.
pub trait Storage {
    /// Read the blob stored under `key`, if any.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `blob` under `key`, replacing any previous value.
    fn save(&self, key: &str, blob: &str) -> StorageResult<()>;

    /// Remove the blob stored under `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if a blob exists.
    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.load(key)?.is_some())
    }
}
