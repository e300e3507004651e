/*!
 * SQLite-backed dictionary store.
 *
 * Mirrors a browser extension's local storage area: a single key/value
 * table where `dict` holds the whole mapping as JSON and `enabled` holds
 * the feature flag. Blocking connection work runs on tokio's blocking pool.
 */

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::watch;

use super::{DictionaryMap, DictionaryStore};
use crate::errors::StoreError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "captionlex.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "captionlex";

const DICT_KEY: &str = "dict";
const ENABLED_KEY: &str = "enabled";

/// Persistent store in a SQLite file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
    enabled: Arc<watch::Sender<bool>>,
}

impl SqliteStore {
    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::open(&db_path)
    }

    /// Open (or create) the store at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening dictionary database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        Self::from_connection(conn, db_path)
    }

    /// Create an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory dictionary database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::from_connection(conn, PathBuf::from(":memory:"))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        initialize_schema(&conn)?;
        let enabled = read_enabled(&conn).context("Failed to read enabled flag")?;
        let (sender, _) = watch::channel(enabled);

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
            enabled: Arc::new(sender),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a connection operation on the blocking pool
    async fn execute_async<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Backend(format!("Failed to acquire database lock: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Database task panicked: {}", e)))?
    }
}

/// Create the key/value table if needed
fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .context("Failed to create storage tables")?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
        .optional()?;

    if version.is_none() {
        info!("Initializing dictionary schema v{}", SCHEMA_VERSION);
        conn.execute(
            "INSERT INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
            [SCHEMA_VERSION],
        )?;
    } else {
        debug!("Dictionary schema is up to date (v{})", SCHEMA_VERSION);
    }

    Ok(())
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
    Ok(conn
        .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| row.get(0))
        .optional()?)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn read_enabled(conn: &Connection) -> Result<bool, StoreError> {
    // Absent flag means the feature has never been turned off.
    Ok(read_value(conn, ENABLED_KEY)?.is_none_or(|value| value == "true"))
}

#[async_trait]
impl DictionaryStore for SqliteStore {
    async fn get_all(&self) -> Result<DictionaryMap, StoreError> {
        self.execute_async(|conn| match read_value(conn, DICT_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(DictionaryMap::new()),
        })
        .await
    }

    async fn set_all(&self, entries: DictionaryMap) -> Result<(), StoreError> {
        let json = serde_json::to_string(&entries)?;
        self.execute_async(move |conn| write_value(conn, DICT_KEY, &json))
            .await
    }

    async fn get_enabled(&self) -> Result<bool, StoreError> {
        self.execute_async(read_enabled).await
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        let value = if enabled { "true" } else { "false" };
        self.execute_async(move |conn| write_value(conn, ENABLED_KEY, value))
            .await?;
        self.enabled.send_replace(enabled);
        Ok(())
    }

    fn subscribe_enabled(&self) -> watch::Receiver<bool> {
        self.enabled.subscribe()
    }
}
