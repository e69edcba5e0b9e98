/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted frame could not be decoded.
    #[error("corrupt log frame at offset {offset}: {reason}")]
    CorruptFrame { offset: u64, reason: String },

    /// A prefix with no finite upper bound (empty, or all `0xFF`) was scanned.
    #[error("prefix has no upper bound")]
    UnboundedPrefix,

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A failed append could not be cut back off the log, so the file tail
    /// no longer matches the in-memory view. Reopen the store to replay it.
    #[error("log file is in an unknown state after a failed append; reopen the store")]
    LogFailed,

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
