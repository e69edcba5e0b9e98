use crate::batch::{BatchOp, WriteBatch};
use crate::error::{StoreError, StoreResult};

/// A key and its value.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Snapshot of a key range in ascending key order.
///
/// The entries are copied out when the scan opens, so holding a `KvRange`
/// never blocks writers and later writes never show up in it. Dropping it
/// releases everything; there is nothing else to close.
#[derive(Debug)]
pub struct KvRange {
    entries: std::vec::IntoIter<KvPair>,
}

impl KvRange {
    pub fn new(entries: Vec<KvPair>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for KvRange {
    type Item = KvPair;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for KvRange {}

/// Ordered key-value store.
///
/// All implementations must satisfy these invariants:
/// - `range(start, end)` yields exactly the keys `k` with `start <= k < end`,
///   in ascending byte order, as of the moment the scan opened.
/// - `commit` applies a batch's ops in order. When `atomic_batches()` is
///   `true` a failed commit leaves no op applied.
/// - All I/O errors are propagated, never silently ignored.
pub trait KvStore: Send + Sync {
    /// Read a value by key. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Scan the half-open key range `[start, end)`.
    ///
    /// An empty or inverted range yields nothing.
    fn range(&self, start: &[u8], end: &[u8]) -> StoreResult<KvRange>;

    /// Apply a batch of puts and deletes.
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Whether `commit` is all-or-nothing for multi-op batches.
    fn atomic_batches(&self) -> bool {
        true
    }

    /// Write a single key.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.commit(WriteBatch::from(BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }))
    }

    /// Remove a single key. Removing an absent key is not an error.
    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.commit(WriteBatch::from(BatchOp::Delete { key: key.to_vec() }))
    }

    /// Check whether a key is present.
    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Scan every key starting with `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<KvRange> {
        let end = prefix_upper_bound(prefix).ok_or(StoreError::UnboundedPrefix)?;
        self.range(prefix, &end)
    }
}

/// Smallest key greater than every key that starts with `prefix`.
///
/// Increments the last byte, dropping trailing `0xFF` bytes first. Returns
/// `None` when no such key exists (empty prefix or all `0xFF`).
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
