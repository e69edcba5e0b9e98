//! Ordered key-value storage for the OpEx ledger.
//!
//! The ledger core never touches files or locks directly. It talks to a
//! [`KvStore`]: point reads, batched writes, and half-open range scans in
//! ascending byte order.
//!
//! # Storage Backends
//!
//! - [`InMemoryKvStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`LogKvStore`] -- append-only, CRC-framed batch log replayed on open
//!
//! # Design Rules
//!
//! 1. A [`WriteBatch`] is the unit of atomicity. Backends that cannot apply
//!    a batch all-or-nothing must say so through [`KvStore::atomic_batches`].
//! 2. Range scans return an owned snapshot taken at scan start.
//! 3. The store never interprets values -- it is a pure key-value store.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod batch;
pub mod error;
pub mod log;
pub mod memory;
pub mod traits;

pub use batch::{BatchOp, WriteBatch};
pub use error::{StoreError, StoreResult};
pub use log::{LogKvStore, ReplayStats, SyncMode};
pub use memory::InMemoryKvStore;
pub use traits::{prefix_upper_bound, KvPair, KvRange, KvStore};
