use std::fmt::Debug;
use thiserror::Error;

pub mod credentials;
pub mod file_store;
pub mod memory_store;

pub use credentials::{CredentialKind, CredentialStore};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A string-keyed persistent store, the client's equivalent of browser local storage.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Stores several entries as one write.
    ///
    /// # Errors
    /// Returns an error if the entries cannot be persisted.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Removes the given keys as one write. Missing keys are ignored.
    ///
    /// # Errors
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;
}
