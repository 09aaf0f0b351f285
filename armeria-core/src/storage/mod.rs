//! Durable key-value storage
//!
//! The token store persists the credential through this trait. It plays the
//! role of the browser's local storage: a handful of string keys that survive
//! a process restart.
//!
//! - [`MemoryStorage`] keeps everything in memory (tests, throwaway sessions)
//! - [`FileStorage`] keeps a JSON map on disk, rewritten on every mutation

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Synchronous key-value storage
///
/// Writes must be durable by the time `set`/`remove` return.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// Implement KeyValueStore for Arc<S> to allow sharing one backend
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
