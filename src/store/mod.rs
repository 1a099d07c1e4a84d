//! Durable client-side key/value storage.
//!
//! The session record and the theme preference both live here. The store
//! is deliberately dumb: string keys to string values, synchronous,
//! process-local, surviving restarts. There is no transaction spanning
//! multiple keys, so a caller that persists a compound entity must
//! validate every piece on the way back out.

mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Key holding the opaque session token.
pub const KEY_TOKEN: &str = "token";
/// Key holding the serialized user record.
pub const KEY_USER: &str = "user";
/// Key holding the display-theme preference.
pub const KEY_THEME: &str = "theme";

/// Process-local durable key/value storage.
///
/// Implementations are synchronous; callers on async tasks accept the
/// short blocking write the same way they accept any local file I/O.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Backs tests and ephemeral profiles; contents die
/// with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
