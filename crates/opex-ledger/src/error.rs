use std::fmt;

use opex_store::StoreError;
use opex_types::{Counterparty, Decimal, Entity, TypeError};
use serde::Serialize;

/// Errors produced by ledger operations.
///
/// Every operation returns exactly one of these or succeeds; there is no
/// partial-success outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    Conflict { kind: &'static str, key: String },

    #[error("{entity} has already confirmed project {project_id}")]
    AlreadyConfirmed {
        project_id: String,
        entity: Counterparty,
    },

    #[error("insufficient funds in {entity}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        entity: Entity,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::AlreadyConfirmed { .. } => ErrorKind::AlreadyConfirmed,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::Unavailable(e.to_string())
    }
}

impl From<TypeError> for LedgerError {
    fn from(e: TypeError) -> Self {
        LedgerError::InvalidArgument(e.to_string())
    }
}

/// Stable, machine-readable error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    AlreadyConfirmed,
    InsufficientFunds,
    Unavailable,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::AlreadyConfirmed => "already_confirmed",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
