//! Core ledger logic for OpEx.
//!
//! This crate holds everything between the store and the front end:
//! - [`AmountLedger`]: the FG/BK/SC/TB balances and transfers between them
//! - [`RecordLog`]: write-once Issue, Distribution and Receivable records
//! - [`ProjectRegistry`] and [`ConfirmationWorkflow`]: projects and the
//!   BK/SC/TB confirmation quorum that moves their allocations
//! - [`QueryService`]: point reads, ordered listings and the conservation check
//! - [`Journal`]: undo-image journal for stores without atomic batches
//! - [`Command`] and [`OPERATIONS`]: the typed operation catalog
//! - [`Ledger`]: the entry point tying these to one store and config

pub mod amount;
pub mod command;
pub mod config;
pub mod confirm;
pub mod error;
pub mod journal;
pub mod keys;
pub mod ledger;
pub mod project;
pub mod query;
pub mod record;
pub mod record_log;

pub use amount::AmountLedger;
pub use command::{Command, Operation, Response, OPERATIONS};
pub use config::{ConfigError, LedgerConfig, StoreConfig};
pub use confirm::{ConfirmOutcome, ConfirmationWorkflow};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use journal::Journal;
pub use keys::KeySpace;
pub use ledger::Ledger;
pub use project::ProjectRegistry;
pub use query::{ConservationReport, QueryService};
pub use record::Record;
pub use record_log::{RecordLog, Scan, ScanIter};
