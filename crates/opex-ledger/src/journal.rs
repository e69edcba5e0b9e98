//! Intent journal for stores without atomic batches.
//!
//! Before a multi-key batch is applied op by op, the journal persists the
//! batch's undo image under `journal/<intent>`: for every key the batch
//! touches, the value it held before (or a delete if it was absent). Once
//! every op has landed the marker is removed. A marker still present at
//! startup means an operation was interrupted; [`Journal::recover`] applies
//! its undo image, which puts the ledger back to the state before that
//! operation began.

use std::collections::HashSet;

use opex_store::{KvStore, WriteBatch};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::keys::KeySpace;

pub struct Journal<'a> {
    store: &'a dyn KvStore,
}

impl<'a> Journal<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    /// Apply `batch` as one unit of work named `intent`.
    pub fn apply(&self, intent: &str, batch: WriteBatch) -> LedgerResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if self.store.atomic_batches() {
            debug!(intent, ops = batch.len(), "committing batch");
            self.store.commit(batch)?;
            return Ok(());
        }

        let key = KeySpace::Journal.key(intent);
        let undo = self.undo_image(&batch)?;
        self.store.put(&key, &encode_batch(&undo)?)?;
        debug!(intent, ops = batch.len(), "intent journaled");

        for op in batch {
            if let Err(e) = self.store.commit(WriteBatch::from(op)) {
                warn!(intent, error = %e, "batch interrupted, rolling back");
                // On any failure here the marker stays for recover().
                let rolled_back = self
                    .store
                    .commit(undo)
                    .and_then(|()| self.store.delete(&key));
                if let Err(rollback) = rolled_back {
                    warn!(intent, error = %rollback, "rollback incomplete, intent left pending");
                }
                return Err(e.into());
            }
        }

        self.store.delete(&key)?;
        debug!(intent, "intent cleared");
        Ok(())
    }

    /// Intents left behind by interrupted operations, in key order.
    pub fn pending(&self) -> LedgerResult<Vec<String>> {
        let (start, end) = KeySpace::Journal.bounds();
        Ok(self
            .store
            .range(&start, &end)?
            .filter_map(|(key, _)| KeySpace::Journal.id_of(&key))
            .collect())
    }

    /// Roll back every interrupted operation. Returns how many were repaired.
    pub fn recover(&self) -> LedgerResult<usize> {
        let (start, end) = KeySpace::Journal.bounds();
        let mut repaired = 0;
        for (key, value) in self.store.range(&start, &end)? {
            let intent = KeySpace::Journal.id_of(&key).unwrap_or_default();
            let undo = decode_batch(&intent, &value)?;
            let mut repair = undo;
            repair.delete(key);
            self.store.commit(repair)?;
            warn!(intent = %intent, "rolled back interrupted operation");
            repaired += 1;
        }
        Ok(repaired)
    }

    fn undo_image(&self, batch: &WriteBatch) -> LedgerResult<WriteBatch> {
        let mut seen = HashSet::new();
        let mut undo = WriteBatch::new();
        for op in batch.ops() {
            let key = op.key();
            if !seen.insert(key.to_vec()) {
                continue;
            }
            match self.store.get(key)? {
                Some(previous) => undo.put(key, previous),
                None => undo.delete(key),
            };
        }
        Ok(undo)
    }
}

fn encode_batch(batch: &WriteBatch) -> LedgerResult<Vec<u8>> {
    bincode::serialize(batch)
        .map_err(|e| LedgerError::Unavailable(format!("cannot encode journal entry: {e}")))
}

fn decode_batch(intent: &str, bytes: &[u8]) -> LedgerResult<WriteBatch> {
    bincode::deserialize(bytes)
        .map_err(|e| LedgerError::Unavailable(format!("corrupt journal entry {intent}: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use opex_store::{BatchOp, InMemoryKvStore, KvRange, StoreError, StoreResult};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Store with non-atomic batches that starts failing commits once its
    /// budget of successful commits runs out.
    pub(crate) struct FlakyStore {
        pub inner: InMemoryKvStore,
        budget: AtomicUsize,
        transient: AtomicBool,
    }

    impl FlakyStore {
        pub fn new() -> Self {
            Self {
                inner: InMemoryKvStore::new(),
                budget: AtomicUsize::new(usize::MAX),
                transient: AtomicBool::new(false),
            }
        }

        /// Fail every commit after the next `commits` succeed.
        pub fn fail_after(&self, commits: usize) {
            self.transient.store(false, Ordering::SeqCst);
            self.budget.store(commits, Ordering::SeqCst);
        }

        /// Fail exactly one commit, the one after the next `commits`.
        pub fn fail_once_after(&self, commits: usize) {
            self.transient.store(true, Ordering::SeqCst);
            self.budget.store(commits, Ordering::SeqCst);
        }

        pub fn heal(&self) {
            self.budget.store(usize::MAX, Ordering::SeqCst);
        }
    }

    impl KvStore for FlakyStore {
        fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn range(&self, start: &[u8], end: &[u8]) -> StoreResult<KvRange> {
            self.inner.range(start, end)
        }

        fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                if self.transient.load(Ordering::SeqCst) {
                    self.heal();
                }
                return Err(StoreError::ReadOnly);
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            self.inner.commit(batch)
        }

        fn atomic_batches(&self) -> bool {
            false
        }
    }

    fn two_key_batch() -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch.put(b"amount/FG".to_vec(), b"new-fg".to_vec());
        batch.put(b"amount/BK".to_vec(), b"new-bk".to_vec());
        batch
    }

    // -----------------------------------------------------------------------
    // Atomic stores
    // -----------------------------------------------------------------------

    #[test]
    fn atomic_store_commits_directly() {
        let store = InMemoryKvStore::new();
        Journal::new(&store).apply("t", two_key_batch()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(Journal::new(&store).pending().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Non-atomic stores
    // -----------------------------------------------------------------------

    #[test]
    fn clean_apply_leaves_no_marker() {
        let store = FlakyStore::new();
        Journal::new(&store).apply("t", two_key_batch()).unwrap();
        assert_eq!(store.get(b"amount/BK").unwrap(), Some(b"new-bk".to_vec()));
        assert!(Journal::new(&store).pending().unwrap().is_empty());
    }

    #[test]
    fn failure_mid_batch_rolls_back_in_place() {
        let store = FlakyStore::new();
        store.put(b"amount/FG", b"old-fg").unwrap();
        // marker + first op succeed, second op fails, rollback succeeds
        store.fail_once_after(2);
        let err = Journal::new(&store).apply("t", two_key_batch()).unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable(_)));
        store.heal();
        assert_eq!(store.get(b"amount/FG").unwrap(), Some(b"old-fg".to_vec()));
        assert_eq!(store.get(b"amount/BK").unwrap(), None);
    }

    #[test]
    fn recover_rolls_back_stranded_intent() {
        let store = FlakyStore::new();
        store.put(b"amount/FG", b"old-fg").unwrap();
        // marker + first op succeed; the op and the rollback both fail
        store.fail_after(2);
        Journal::new(&store)
            .apply("confirm/P1/BK", two_key_batch())
            .unwrap_err();
        store.heal();

        let journal = Journal::new(&store);
        assert_eq!(journal.pending().unwrap(), vec!["confirm/P1/BK"]);
        assert_eq!(store.get(b"amount/FG").unwrap(), Some(b"new-fg".to_vec()));

        assert_eq!(journal.recover().unwrap(), 1);
        assert_eq!(store.get(b"amount/FG").unwrap(), Some(b"old-fg".to_vec()));
        assert_eq!(store.get(b"amount/BK").unwrap(), None);
        assert!(journal.pending().unwrap().is_empty());
    }

    #[test]
    fn recover_with_nothing_pending() {
        let store = FlakyStore::new();
        assert_eq!(Journal::new(&store).recover().unwrap(), 0);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let store = FlakyStore::new();
        store.fail_after(0);
        Journal::new(&store).apply("t", WriteBatch::new()).unwrap();
    }

    #[test]
    fn undo_image_records_previous_values() {
        let store = InMemoryKvStore::new();
        store.put(b"a", b"1").unwrap();
        let mut batch = WriteBatch::new();
        batch.put(b"a".to_vec(), b"2".to_vec());
        batch.put(b"b".to_vec(), b"3".to_vec());
        batch.put(b"a".to_vec(), b"4".to_vec());
        let undo = Journal::new(&store).undo_image(&batch).unwrap();
        assert_eq!(
            undo.ops(),
            &[
                BatchOp::Put {
                    key: b"a".to_vec(),
                    value: b"1".to_vec()
                },
                BatchOp::Delete { key: b"b".to_vec() },
            ]
        );
    }
}
