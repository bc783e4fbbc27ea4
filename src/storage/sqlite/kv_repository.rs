use rusqlite::OptionalExtension;

use crate::errors::NewsResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::KeyValueStore;

pub struct SqliteKeyValueStore {
    storage: SqliteStorage,
}

impl SqliteKeyValueStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> NewsResult<Option<String>> {
        let conn = self.storage.connection()?;
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> NewsResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            (key, value),
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> NewsResult<()> {
        let conn = self.storage.connection()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> SqliteKeyValueStore {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteKeyValueStore::new(storage)
    }

    #[test]
    fn test_put_and_get() {
        let store = setup_store();

        assert_eq!(store.get("news").unwrap(), None);
        store.put("news", "{}").unwrap();
        assert_eq!(store.get("news").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_put_overwrites() {
        let store = setup_store();

        store.put("news", "first").unwrap();
        store.put("news", "second").unwrap();
        assert_eq!(store.get("news").unwrap().as_deref(), Some("second"));

        let conn = store.storage.connection().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_remove() {
        let store = setup_store();

        store.put("news", "v").unwrap();
        store.remove("news").unwrap();
        assert_eq!(store.get("news").unwrap(), None);

        // Removing a missing key is not an error
        store.remove("news").unwrap();
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");

        {
            let store = SqliteKeyValueStore::new(SqliteStorage::new(&db_path).unwrap());
            store.put("news", "persisted").unwrap();
        }

        let reopened = SqliteKeyValueStore::new(SqliteStorage::new(&db_path).unwrap());
        assert_eq!(reopened.get("news").unwrap().as_deref(), Some("persisted"));
    }
}
