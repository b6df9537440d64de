//! Idempotency cache for bulk operations
//!
//! Entries are keyed by `(family, idempotency_key)`: the same key used with
//! two different families refers to two different entries. The create family
//! is usually backed by [`SqliteStore`] so retries survive a restart; the
//! other families use [`MemoryStore`].
//!
//! [`TtlCache`] is unrelated to idempotency: it holds area, project and tag
//! listings for a few minutes.

mod memory;
mod sqlite;
mod ttl;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use ttl::TtlCache;

use thiserror::Error;

use crate::types::{BulkFamily, CachedBatch, ClientRecord};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Cache directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache is closed")]
    Closed,
}

/// Storage for completed batch results.
///
/// Implementations must be safe to share between concurrent tool calls.
/// Callers treat any [`CacheError`] from `get` as a miss.
pub trait IdempotencyStore: Send + Sync {
    fn get(&self, family: BulkFamily, key: &str) -> Result<Option<CachedBatch>, CacheError>;

    /// Insert or replace the entry for `(family, key)`
    fn set(&self, family: BulkFamily, key: &str, entry: &CachedBatch) -> Result<(), CacheError>;

    /// Look up what a `client_id` resolved to in a stored batch
    fn client_record(
        &self,
        family: BulkFamily,
        key: &str,
        client_id: &str,
    ) -> Result<Option<ClientRecord>, CacheError> {
        Ok(self
            .get(family, key)?
            .and_then(|entry| entry.clients.get(client_id).cloned()))
    }

    /// Drop every entry of one family
    fn clear(&self, family: BulkFamily) -> Result<(), CacheError>;

    /// Release underlying resources. Later calls fail with [`CacheError::Closed`].
    fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
