//! In-memory key-value storage
//!
//! Thread-safe map behind an RwLock. Contents are lost when the process exits.

use super::KeyValueStore;
use crate::error::StorageError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory storage backend
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set("authToken", "abc").unwrap();
        assert_eq!(storage.get("authToken").unwrap().as_deref(), Some("abc"));

        storage.set("authToken", "def").unwrap();
        assert_eq!(storage.get("authToken").unwrap().as_deref(), Some("def"));
        assert_eq!(storage.len(), 1);

        storage.remove("authToken").unwrap();
        assert!(storage.get("authToken").unwrap().is_none());

        // Removing twice is fine
        storage.remove("authToken").unwrap();
    }

    #[test]
    fn test_memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }
}
