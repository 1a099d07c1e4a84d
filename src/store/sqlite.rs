//! SQLite-backed implementation of [`KeyValueStore`].
//!
//! One `kv` table, one connection behind a mutex. Client-scale traffic is
//! a handful of reads at startup and a write per state change, so nothing
//! fancier is warranted.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rusqlite::params;

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Durable key/value store persisted to a local SQLite database.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match row {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value, epoch_secs() as i64],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(&tmp.path().join("client.db")).unwrap();
        (tmp, store)
    }

    #[test]
    fn set_get_remove() {
        let (_tmp, store) = test_store();

        assert_eq!(store.get("token").unwrap(), None);

        store.set("token", "opaque-value").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("opaque-value"));

        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn set_replaces_existing_value() {
        let (_tmp, store) = test_store();

        store.set("theme", "light").unwrap();
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn values_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("client.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.set("token", "persisted").unwrap();
            store.set("user", r#"{"id":"u1"}"#).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("persisted"));
        assert_eq!(store.get("user").unwrap().as_deref(), Some(r#"{"id":"u1"}"#));
    }

    #[test]
    fn remove_absent_key_is_ok() {
        let (_tmp, store) = test_store();
        store.remove("never-set").unwrap();
    }
}
