//! Token store - the single owner of the bearer credential
//!
//! The credential is an opaque bearer token plus an optional active role.
//! Every write goes to durable storage first and to the in-memory copy second,
//! so the two never diverge: a failed write leaves both untouched.

use crate::error::StorageError;
use crate::storage::{KeyValueStore, MemoryStorage};
use std::sync::{Arc, RwLock};

/// Default storage key for the bearer token
pub const DEFAULT_TOKEN_KEY: &str = "authToken";

/// Default storage key for the active role
pub const DEFAULT_ACTIVE_ROLE_KEY: &str = "activeRole";

/// In-memory copy; the outer `None` means "not read from storage yet"
#[derive(Debug, Default)]
struct Credential {
    token: Option<Option<String>>,
    active_role: Option<Option<String>>,
}

impl Credential {
    fn cleared() -> Self {
        Self { token: Some(None), active_role: Some(None) }
    }
}

/// Process-wide credential holder backed by a [`KeyValueStore`]
///
/// Cheap to share behind an `Arc`; the gateway, the session manager and the
/// route guard all hold the same instance.
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    token_key: String,
    role_key: String,
    cached: RwLock<Credential>,
}

impl TokenStore {
    /// Create a token store over the given durable storage
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_keys(storage, DEFAULT_TOKEN_KEY, DEFAULT_ACTIVE_ROLE_KEY)
    }

    /// Create a token store using custom storage keys
    pub fn with_keys(
        storage: Arc<dyn KeyValueStore>,
        token_key: impl Into<String>,
        role_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            token_key: token_key.into(),
            role_key: role_key.into(),
            cached: RwLock::new(Credential::default()),
        }
    }

    /// Token store over a fresh in-memory storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Store the bearer token in durable storage and in memory
    pub fn set_token(&self, value: &str) -> Result<(), StorageError> {
        self.storage.set(&self.token_key, value)?;
        self.write_cache(|c| c.token = Some(Some(value.to_string())))
    }

    /// Current bearer token
    ///
    /// Served from memory once known; otherwise read once from durable
    /// storage and cached.
    pub fn get_token(&self) -> Option<String> {
        if let Some(token) = self.read_cache(|c| c.token.clone()) {
            return token;
        }

        match self.storage.get(&self.token_key) {
            Ok(token) => {
                let _ = self.write_cache(|c| c.token = Some(token.clone()));
                token
            }
            Err(e) => {
                log::warn!("Failed to read token from storage: {}", e);
                None
            }
        }
    }

    /// Destroy the credential (token and active role) in storage and memory
    ///
    /// The in-memory copy is always cleared and stops falling back to
    /// storage, so this process does not send the credential again even when
    /// the storage write fails. A later process may still find it on disk.
    pub fn clear_token(&self) -> Result<(), StorageError> {
        let token_result = self.storage.remove(&self.token_key);
        let role_result = self.storage.remove(&self.role_key);
        self.write_cache(|c| *c = Credential::cleared())?;
        token_result?;
        role_result
    }

    /// True iff a non-empty token is present
    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some_and(|t| !t.is_empty())
    }

    /// Record the role the user is currently acting as
    pub fn set_active_role(&self, role: &str) -> Result<(), StorageError> {
        self.storage.set(&self.role_key, role)?;
        self.write_cache(|c| c.active_role = Some(Some(role.to_string())))
    }

    /// Role sent as `X-Active-Role`, if one was selected
    pub fn active_role(&self) -> Option<String> {
        if let Some(role) = self.read_cache(|c| c.active_role.clone()) {
            return role;
        }

        match self.storage.get(&self.role_key) {
            Ok(role) => {
                let _ = self.write_cache(|c| c.active_role = Some(role.clone()));
                role
            }
            Err(e) => {
                log::warn!("Failed to read active role from storage: {}", e);
                None
            }
        }
    }

    /// Forget the active role but keep the token
    pub fn clear_active_role(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.role_key)?;
        self.write_cache(|c| c.active_role = Some(None))
    }

    fn read_cache<T>(&self, f: impl FnOnce(&Credential) -> T) -> T {
        match self.cached.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write_cache(&self, f: impl FnOnce(&mut Credential)) -> Result<(), StorageError> {
        let mut guard = self.cached.write().map_err(|_| StorageError::Poisoned)?;
        f(&mut guard);
        Ok(())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("token_key", &self.token_key)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;

    /// Storage that counts reads so caching can be observed
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl KeyValueStore for CountingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    /// Storage whose removals always fail
    #[derive(Default)]
    struct StickyStorage {
        inner: MemoryStorage,
    }

    impl KeyValueStore for StickyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
        }
    }

    #[test]
    fn test_set_get_clear() {
        let store = TokenStore::in_memory();
        assert!(!store.is_authenticated());
        assert!(store.get_token().is_none());

        store.set_token("abc").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.get_token().as_deref(), Some("abc"));

        store.clear_token().unwrap();
        assert!(!store.is_authenticated());
        assert!(store.get_token().is_none());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let store = TokenStore::in_memory();
        store.set_token("").unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_is_authenticated_tracks_latest_call() {
        let store = TokenStore::in_memory();
        let ops: [Option<&str>; 6] = [Some("a"), None, None, Some("b"), Some("c"), None];
        for op in ops {
            match op {
                Some(t) => store.set_token(t).unwrap(),
                None => store.clear_token().unwrap(),
            }
            assert_eq!(store.is_authenticated(), op.is_some());
        }
    }

    #[test]
    fn test_reads_are_cached_after_first_storage_hit() {
        let storage = Arc::new(CountingStorage::default());
        storage.inner.set(DEFAULT_TOKEN_KEY, "persisted").unwrap();
        let store = TokenStore::new(storage.clone());

        assert_eq!(store.get_token().as_deref(), Some("persisted"));
        assert_eq!(store.get_token().as_deref(), Some("persisted"));
        assert_eq!(storage.reads.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_token_does_not_touch_storage_on_read() {
        let storage = Arc::new(CountingStorage::default());
        let store = TokenStore::new(storage.clone());
        store.set_token("fresh").unwrap();

        assert_eq!(store.get_token().as_deref(), Some("fresh"));
        assert_eq!(storage.reads.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(storage.inner.get(DEFAULT_TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_fresh_process_sees_last_persisted_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let store = TokenStore::new(Arc::new(FileStorage::open(&path).unwrap()));
            store.set_token("first").unwrap();
            store.set_token("second").unwrap();
            store.set_active_role("FINANCE").unwrap();
        }

        let restarted = TokenStore::new(Arc::new(FileStorage::open(&path).unwrap()));
        assert_eq!(restarted.get_token().as_deref(), Some("second"));
        assert_eq!(restarted.active_role().as_deref(), Some("FINANCE"));

        restarted.clear_token().unwrap();
        let again = TokenStore::new(Arc::new(FileStorage::open(&path).unwrap()));
        assert!(!again.is_authenticated());
        assert!(again.active_role().is_none());
    }

    #[test]
    fn test_clear_token_drops_active_role() {
        let store = TokenStore::in_memory();
        store.set_token("t").unwrap();
        store.set_active_role("VENDOR").unwrap();
        assert_eq!(store.active_role().as_deref(), Some("VENDOR"));

        store.clear_token().unwrap();
        assert!(store.active_role().is_none());
    }

    #[test]
    fn test_clear_active_role_keeps_token() {
        let store = TokenStore::in_memory();
        store.set_token("t").unwrap();
        store.set_active_role("VENDOR").unwrap();
        store.clear_active_role().unwrap();

        assert!(store.active_role().is_none());
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_failed_clear_still_forgets_credential() {
        let storage = Arc::new(StickyStorage::default());
        let store = TokenStore::new(storage.clone());
        store.set_token("rejected").unwrap();
        store.set_active_role("ADMIN").unwrap();

        assert!(store.clear_token().is_err());
        assert!(store.get_token().is_none());
        assert!(store.active_role().is_none());
        assert!(!store.is_authenticated());

        // Only a fresh process would pick the stale value back up
        let restarted = TokenStore::new(storage);
        assert_eq!(restarted.get_token().as_deref(), Some("rejected"));
    }

    #[test]
    fn test_failed_file_write_keeps_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = Arc::new(FileStorage::open(&path).unwrap());

        let store = TokenStore::new(storage.clone());
        store.set_token("old").unwrap();

        // A directory where the temp file should go makes every write fail
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(store.set_token("new").is_err());
        assert_eq!(store.get_token().as_deref(), Some("old"));

        let other = TokenStore::new(storage);
        assert_eq!(other.get_token().as_deref(), Some("old"));
    }
}
