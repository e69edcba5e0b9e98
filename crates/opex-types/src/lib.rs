//! Foundation types for the OpEx funds-allocation ledger.
//!
//! This crate provides the account, record, and request types shared by the
//! store-facing ledger crate and the command-line front end. Every other
//! OpEx crate depends on `opex-types`.
//!
//! # Key Types
//!
//! - [`Entity`]: one of the four ledger accounts (FG, BK, SC, TB)
//! - [`Counterparty`]: the three accounts that confirm allocations
//! - [`ProjectId`]: validated identifier shared by all records of a project
//! - [`Amount`], [`Issue`], [`Project`], [`Distribution`], [`Receivable`]: stored records
//! - [`ProjectRequest`] and friends: typed, validated operation arguments
//! - [`Clock`]: date source for the fiscal-year rule
//! - [`CallerIdentity`]: audit-only caller name

pub mod entity;
pub mod error;
pub mod identity;
pub mod money;
pub mod project_id;
pub mod records;
pub mod request;
pub mod temporal;

pub use entity::{Counterparty, Entity};
pub use error::TypeError;
pub use identity::{AnonymousCaller, CallerIdentity, FixedCaller};
pub use money::parse_amount;
pub use project_id::ProjectId;
pub use records::{
    Allocation, Amount, ConfirmationState, Distribution, Issue, Project, Receivable, CURRENCY,
};
pub use request::{
    Assignment, DistributionRequest, FeePercents, FeeShare, IssueRequest, ProjectRequest,
    ReceivableRequest,
};
pub use temporal::{fiscal_year, Clock, FixedClock, SystemClock};

/// Re-exported so downstream crates agree on one decimal type.
pub use rust_decimal::Decimal;
