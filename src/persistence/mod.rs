//! Durable local storage for user-adjusted layouts.
//!
//! Each relocatable collection lives in its own versionless slot, written
//! wholesale. Nothing here raises: writes report success as a flag and reads
//! that fail to parse are treated as absent.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use tracing::{debug, info, warn};

use crate::errors::StorageResult;
use crate::model::{EntityKind, LocatedEntity};

/// String key-value storage scoped to this application.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

pub struct PersistenceAdapter {
    backend: Box<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Store the full collection under the slot for `T::KIND`.
    ///
    /// Returns false on serialization or write failure; the caller decides
    /// how to surface that as a soft warning.
    pub fn save<T: LocatedEntity>(&mut self, entities: &[T]) -> bool {
        let key = T::KIND.storage_key();
        let payload = match serde_json::to_string(entities) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not serialize {} collection: {}", T::KIND, e);
                return false;
            }
        };

        match self.backend.set(key, &payload) {
            Ok(()) => {
                debug!("Saved {} {} entities under '{}'", entities.len(), T::KIND, key);
                true
            }
            Err(e) if e.is_quota() => {
                warn!("Local storage is full, {} layout not saved: {}", T::KIND, e);
                false
            }
            Err(e) => {
                warn!("Could not persist {} collection: {}", T::KIND, e);
                false
            }
        }
    }

    /// Read back a previously saved collection.
    ///
    /// Missing slots, read errors and content that is not an array of `T`
    /// all yield `None`.
    pub fn load<T: LocatedEntity>(&self) -> Option<Vec<T>> {
        let key = T::KIND.storage_key();
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read persisted {} collection: {}", T::KIND, e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(entities) => Some(entities),
            Err(e) => {
                warn!("Ignoring corrupt persisted {} collection: {}", T::KIND, e);
                None
            }
        }
    }

    /// Drop the override for one kind so the authoritative data is used on the
    /// next load.
    pub fn clear(&mut self, kind: EntityKind) -> bool {
        match self.backend.remove(kind.storage_key()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not clear persisted {} collection: {}", kind, e);
                false
            }
        }
    }

    pub fn reset(&mut self) -> bool {
        let cleared = EntityKind::ALL
            .iter()
            .fold(true, |ok, kind| self.clear(*kind) && ok);
        if cleared {
            info!("Persisted positions reset to authoritative defaults");
        }
        cleared
    }
}
