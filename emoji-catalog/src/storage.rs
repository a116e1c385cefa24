//! Key-value persistence for picker preferences
//!
//! The frequency tracker keeps two small JSON values under an application
//! namespace. `SqliteStore` persists them through an r2d2 connection pool;
//! `MemoryStore` backs hosts without a disk and tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Namespace used by the picker for its persisted entries.
pub const DEFAULT_NAMESPACE: &str = "emoji-mart";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw string storage. Implementations may fail; callers that treat loss of
/// state as non-critical go through [`Preferences`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLITE
// ─────────────────────────────────────────────────────────────────────────────

/// Thread-safe key-value table using connection pooling
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
            ",
            )?;
            Ok(())
        });

        let pool = Pool::builder().max_size(4).build(manager)?;

        let store = Self { pool };
        store.setup_schema()?;
        Ok(store)
    }

    /// Open an in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        let manager = SqliteConnectionManager::memory();

        // In-memory needs single connection to maintain state
        let pool = Pool::builder().max_size(1).build(manager)?;

        let store = Self { pool };
        store.setup_schema()?;
        Ok(store)
    }

    fn get_conn(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MEMORY
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NAMESPACED JSON HELPER
// ─────────────────────────────────────────────────────────────────────────────

/// Namespaced JSON values on top of a [`KeyValueStore`].
///
/// Storage and parse failures degrade to "not found" on read and are dropped
/// on write.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), DEFAULT_NAMESPACE)
    }

    fn key(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(&self.key(key)) {
            Ok(raw) => raw?,
            Err(e) => {
                log::debug!("preferences: read of {} failed: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("preferences: {} holds invalid JSON: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("preferences: cannot encode {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key(key), &raw) {
            log::debug!("preferences: write of {} failed: {}", key, e);
        }
    }
}
