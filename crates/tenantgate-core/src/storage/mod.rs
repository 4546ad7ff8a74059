//! Durable key/value storage for session state.
//!
//! The session store only needs three operations on a flat string map, so
//! every backend implements `KeyValueStore`:
//! - `MemoryStore`: volatile, process-local map
//! - `FileStore`: a JSON document on disk that survives restarts
//! - `KeyringStore`: one OS keychain entry per key

pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

pub use error::StorageError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// A string key/value store scoped to one client instance.
///
/// Methods take `&self` so a single backend can be shared behind an `Arc`;
/// implementations handle their own interior locking.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
