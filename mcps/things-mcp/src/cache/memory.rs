//! In-memory idempotency store, lost on restart

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{CacheError, IdempotencyStore};
use crate::types::{BulkFamily, CachedBatch};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(BulkFamily, String), CachedBatch>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(BulkFamily, String), CachedBatch>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdempotencyStore for MemoryStore {
    fn get(&self, family: BulkFamily, key: &str) -> Result<Option<CachedBatch>, CacheError> {
        Ok(self.entries().get(&(family, key.to_string())).cloned())
    }

    fn set(&self, family: BulkFamily, key: &str, entry: &CachedBatch) -> Result<(), CacheError> {
        self.entries()
            .insert((family, key.to_string()), entry.clone());
        Ok(())
    }

    fn clear(&self, family: BulkFamily) -> Result<(), CacheError> {
        self.entries().retain(|(f, _), _| *f != family);
        Ok(())
    }
}
