use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::batch::WriteBatch;
use crate::error::{StoreError, StoreResult};
use crate::traits::{KvRange, KvStore};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory, `BTreeMap`-based key-value store.
///
/// Intended for tests and embedding. Batches are applied under a single
/// write lock, so they are atomic with respect to readers and to each other.
pub struct InMemoryKvStore {
    entries: RwLock<Map>,
    read_only: AtomicBool,
}

impl InMemoryKvStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// When set, every commit fails with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, Map>> {
        self.entries.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, Map>> {
        self.entries.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn range(&self, start: &[u8], end: &[u8]) -> StoreResult<KvRange> {
        if start >= end {
            return Ok(KvRange::empty());
        }
        let map = self.read_map()?;
        let entries = map
            .range::<[u8], _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(KvRange::new(entries))
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let mut map = self.write_map()?;
        batch.apply_to(&mut map);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
