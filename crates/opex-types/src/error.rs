use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced while parsing or validating ledger types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("incorrect number of arguments: expected {expected}, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("expected a decimal value for {field}, got {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("invalid project id {0:?}: control characters are not allowed")]
    InvalidProjectId(String),

    #[error("unknown entity {0:?}: expected one of FG, BK, SC, TB")]
    UnknownEntity(String),

    #[error("{0} is not a confirming counterparty: expected one of BK, SC, TB")]
    NotCounterparty(String),
}
