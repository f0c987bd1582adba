//! SQLite-backed cache store

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use speedhub_core::{CacheError, CacheStore};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .context("Failed to open cache database")?;

        // Set busy timeout to 5 seconds (handles brief lock conflicts)
        conn.pragma_update(None, "busy_timeout", "5000")
            .context("Failed to set busy timeout")?;

        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory cache database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.lock().execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        info!("Cache database initialized");

        Ok(())
    }

    #[cfg(test)]
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn store_error(e: rusqlite::Error) -> CacheError {
    CacheError::Store(e.to_string())
}

impl CacheStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.lock()
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_error)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.lock()
            .execute(
                "INSERT INTO cache_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, chrono::Utc::now().timestamp()],
            )
            .map_err(store_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.lock()
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
            .map_err(store_error)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock()
            .execute("DELETE FROM cache_entries", [])
            .map_err(store_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use speedhub_core::TtlCache;
    use std::time::Duration;

    #[test]
    fn test_save_load_remove() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load("ipInfo").unwrap(), None);

        store.save("ipInfo", "first").unwrap();
        store.save("ipInfo", "second").unwrap();
        assert_eq!(store.load("ipInfo").unwrap().as_deref(), Some("second"));
        assert_eq!(store.count().unwrap(), 1);

        store.remove("ipInfo").unwrap();
        assert_eq!(store.load("ipInfo").unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save("a", "1").unwrap();
        store.save("b", "2").unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_ttl_cache_over_sqlite() {
        let cache = TtlCache::new(SqliteStore::open_in_memory().unwrap());
        let ttl = Duration::from_secs(30 * 60);

        cache.put_at("weatherData_Lahore", json!({"temperature": 31}), 0);
        assert_eq!(
            cache.get_at("weatherData_Lahore", ttl, 29 * 60 * 1000),
            Some(json!({"temperature": 31}))
        );
        assert_eq!(cache.get_at("weatherData_Lahore", ttl, 30 * 60 * 1000), None);
        assert_eq!(cache.store().count().unwrap(), 0);
    }
}
