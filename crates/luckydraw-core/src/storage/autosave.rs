//! Save-on-change persistence of the session.
//!
//! Every state transition writes the whole session. A failed write is
//! logged and leaves the in-memory session untouched; the saver stays
//! dirty until a later write succeeds.

use crate::codec::{self, DeserializeError};
use crate::session::Session;
use crate::storage::{Storage, StorageError, StorageResult};

/// Key the session blob is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "luckyDrawState";

/// Writes the session to a storage backend after each change.
pub struct AutoSaver {
    /// Storage backend.
    storage: Box<dyn Storage>,
    /// Key of the session blob.
    key: String,
    /// Whether the last change has not reached storage.
    dirty: bool,
}

impl AutoSaver {
    /// Create a saver writing under `key`.
    pub fn new(storage: Box<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            dirty: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check if the latest session has not been written.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the session, returning any failure.
    pub fn save(&mut self, session: &Session) -> StorageResult<()> {
        self.dirty = true;
        let blob = codec::serialize(session)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.save(&self.key, &blob)?;
        self.dirty = false;
        Ok(())
    }

    /// Write the session, logging and swallowing any failure.
    /// Returns true if the write succeeded.
    pub fn persist(&mut self, session: &Session) -> bool {
        match self.save(session) {
            Ok(()) => {
                log::debug!("Session saved under '{}'", self.key);
                true
            }
            Err(e) => {
                log::error!("Failed to save state: {}", e);
                false
            }
        }
    }

    /// Read the stored session.
    ///
    /// `Ok(None)` when nothing has been stored yet.
    pub fn try_load(&self) -> Result<Option<Session>, LoadError> {
        let Some(blob) = self.storage.load(&self.key)? else {
            return Ok(None);
        };
        Ok(Some(codec::deserialize(&blob)?))
    }

    /// Read the stored session, falling back to `None` on any failure.
    pub fn load(&mut self) -> Option<Session> {
        match self.try_load() {
            Ok(session) => {
                self.dirty = false;
                session
            }
            Err(e) => {
                log::error!("Failed to load state: {}", e);
                None
            }
        }
    }

    /// Remove the stored session.
    pub fn clear(&mut self) {
        match self.storage.delete(&self.key) {
            Ok(()) => self.dirty = false,
            Err(e) => log::warn!("Failed to remove saved state: {}", e),
        }
    }
}

/// Failure to read a stored session.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

/// Create a platform-appropriate storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Box<dyn Storage>> {
    Ok(Box::new(crate::storage::FileStorage::default_location()?))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Box<dyn Storage>> {
    Ok(Box::new(crate::storage::LocalStorage::new()))
}
