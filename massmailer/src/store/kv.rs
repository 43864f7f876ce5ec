//! Key-value backends for settings and templates.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use super::StoreError;

/// Which backend to open. Chosen once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// One JSON file per key in the data directory.
    #[default]
    Json,
    /// A bundled SQLite database in the data directory.
    Sqlite,
}

impl StoreKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "file" | "files" => Some(StoreKind::Json),
            "sqlite" | "db" => Some(StoreKind::Sqlite),
            _ => None,
        }
    }
}

/// Key-value capability used by the storage service.
#[derive(Debug)]
pub enum KeyValueStore {
    Primary(JsonFileStore),
    EmbeddedDb(SqliteStore),
}

impl KeyValueStore {
    /// Open the selected backend rooted at `dir`, creating it if needed.
    pub fn open(kind: StoreKind, dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        let store = match kind {
            StoreKind::Json => KeyValueStore::Primary(JsonFileStore::new(dir)),
            StoreKind::Sqlite => KeyValueStore::EmbeddedDb(SqliteStore::open(&dir.join("massmailer.db"))?),
        };

        info!(kind = ?kind, dir = %dir.display(), "store_opened");
        Ok(store)
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self {
            KeyValueStore::Primary(store) => store.get(key),
            KeyValueStore::EmbeddedDb(store) => store.get(key),
        }
    }

    pub fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        match self {
            KeyValueStore::Primary(store) => store.put(key, value),
            KeyValueStore::EmbeddedDb(store) => store.put(key, value),
        }
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            KeyValueStore::Primary(store) => store.remove(key),
            KeyValueStore::EmbeddedDb(store) => store.remove(key),
        }
    }
}

/// Pretty-printed `<key>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }

    pub fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.path(key), content)?;
        debug!(key = key, backend = "json", "store_put");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Single-table SQLite store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;

        raw.map(|content| {
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    pub fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, serde_json::to_string(value)?],
        )?;
        debug!(key = key, backend = "sqlite", "store_put");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Store raw text without validation.
    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &str, content: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, content],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise(store: &KeyValueStore) {
        assert_eq!(store.get("settings").unwrap(), None);

        store.put("settings", &json!({"webhookUrl": "https://x"})).unwrap();
        assert_eq!(
            store.get("settings").unwrap(),
            Some(json!({"webhookUrl": "https://x"}))
        );

        store.put("settings", &json!({"webhookUrl": "https://y"})).unwrap();
        assert_eq!(store.get("settings").unwrap().unwrap()["webhookUrl"], "https://y");

        store.remove("settings").unwrap();
        assert_eq!(store.get("settings").unwrap(), None);
        store.remove("settings").unwrap();
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyValueStore::open(StoreKind::Json, dir.path()).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyValueStore::open(StoreKind::Sqlite, dir.path()).unwrap();
        exercise(&store);
        assert!(dir.path().join("massmailer.db").exists());
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("templates.json"), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(store.get("templates"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_sqlite_corrupt_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_raw("templates", "[oops").unwrap();
        assert!(matches!(store.get("templates"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_store_kind_parse() {
        assert_eq!(StoreKind::parse("JSON"), Some(StoreKind::Json));
        assert_eq!(StoreKind::parse("sqlite"), Some(StoreKind::Sqlite));
        assert_eq!(StoreKind::parse("redis"), None);
    }
}
