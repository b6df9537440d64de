//! SQLite-backed idempotency store
//!
//! One row per `(family, idempotency_key)`. The batch result and the
//! client-id map are stored as JSON text. Several server processes may share
//! the file; SQLite's own locking serializes writers and `busy_timeout` makes
//! readers wait instead of failing.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use super::{CacheError, IdempotencyStore};
use crate::types::{BatchResult, BulkFamily, CachedBatch};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the cache file, creating parent directories as needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init_schema(&conn)?;
        info!("Opened bulk idempotency cache at {}", path.display());

        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS bulk_idempotency (
                family TEXT NOT NULL,
                idempotency_key TEXT NOT NULL,
                batch TEXT NOT NULL,
                clients TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                PRIMARY KEY (family, idempotency_key)
            );
            "#,
        )
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;
        f(conn)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdempotencyStore for SqliteStore {
    fn get(&self, family: BulkFamily, key: &str) -> Result<Option<CachedBatch>, CacheError> {
        self.with_conn(|conn| {
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT batch, clients FROM bulk_idempotency
                     WHERE family = ?1 AND idempotency_key = ?2",
                    params![family.as_str(), key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((batch, clients)) = row else {
                return Ok(None);
            };
            let batch: BatchResult = serde_json::from_str(&batch)?;
            let clients = serde_json::from_str(&clients)?;
            debug!(family = %family, key, "idempotency cache hit");
            Ok(Some(CachedBatch { batch, clients }))
        })
    }

    fn set(&self, family: BulkFamily, key: &str, entry: &CachedBatch) -> Result<(), CacheError> {
        let batch = serde_json::to_string(&entry.batch)?;
        let clients = serde_json::to_string(&entry.clients)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO bulk_idempotency
                 (family, idempotency_key, batch, clients, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    family.as_str(),
                    key,
                    batch,
                    clients,
                    Utc::now().to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    fn clear(&self, family: BulkFamily) -> Result<(), CacheError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM bulk_idempotency WHERE family = ?1",
                params![family.as_str()],
            )?;
            Ok(())
        })
    }

    fn close(&self) -> Result<(), CacheError> {
        match self.lock().take() {
            Some(conn) => conn.close().map_err(|(_, e)| CacheError::Database(e)),
            None => Ok(()),
        }
    }
}
