use std::marker::PhantomData;

use opex_store::{KvRange, KvStore, WriteBatch};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::record::{decode, encode, Record};

/// Write-once-per-id records of one kind.
///
/// Backs the Issue, Distribution and Receivable logs, and the storage half of
/// the project registry and amount ledger.
pub struct RecordLog<'a, R> {
    store: &'a dyn KvStore,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record> RecordLog<'a, R> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Store a new record. Fails `Conflict` if one already exists for its id.
    pub fn create(&self, record: &R) -> LedgerResult<()> {
        self.ensure_absent(record.record_id())?;
        self.overwrite(record)
    }

    /// Store a record whether or not one already exists.
    pub fn overwrite(&self, record: &R) -> LedgerResult<()> {
        let mut batch = WriteBatch::new();
        self.stage(&mut batch, record)?;
        self.store.commit(batch)?;
        debug!(kind = R::SPACE.label(), id = record.record_id(), "record written");
        Ok(())
    }

    /// Add a put of `record` to `batch` without touching the store.
    pub fn stage(&self, batch: &mut WriteBatch, record: &R) -> LedgerResult<()> {
        batch.put(record.record_key(), encode(record)?);
        Ok(())
    }

    pub fn get(&self, id: &str) -> LedgerResult<R> {
        self.find(id)?.ok_or_else(|| LedgerError::NotFound {
            kind: R::SPACE.label(),
            key: id.to_string(),
        })
    }

    pub fn find(&self, id: &str) -> LedgerResult<Option<R>> {
        let key = R::SPACE.key(id);
        match self.store.get(&key)? {
            Some(bytes) => decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn ensure_absent(&self, id: &str) -> LedgerResult<()> {
        if self.store.contains(&R::SPACE.key(id))? {
            return Err(LedgerError::Conflict {
                kind: R::SPACE.label(),
                key: id.to_string(),
            });
        }
        Ok(())
    }

    /// Every record of this kind, in ascending id order.
    pub fn list_all(&self) -> Scan<'a, R> {
        Scan {
            store: self.store,
            _record: PhantomData,
        }
    }
}

/// A restartable listing of one record kind.
///
/// Nothing is read until [`Scan::iter`] is called; each call opens a fresh
/// snapshot of the kind's key range.
pub struct Scan<'a, R> {
    store: &'a dyn KvStore,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Scan<'_, R> {
    pub fn iter(&self) -> LedgerResult<ScanIter<R>> {
        let (start, end) = R::SPACE.bounds();
        let range = self.store.range(&start, &end)?;
        debug!(kind = R::SPACE.label(), entries = range.len(), "scan opened");
        Ok(ScanIter {
            range,
            _record: PhantomData,
        })
    }

    pub fn collect_all(&self) -> LedgerResult<Vec<R>> {
        self.iter()?.collect()
    }
}

/// Records decoded one at a time from a range snapshot.
pub struct ScanIter<R> {
    range: KvRange,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Iterator for ScanIter<R> {
    type Item = LedgerResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.range.next()?;
        Some(decode(&key, &value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}
