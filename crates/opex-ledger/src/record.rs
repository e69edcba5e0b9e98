//! Stored-record encoding.
//!
//! Records are kept as JSON objects whose field names match the record
//! structs, so a raw dump of the store stays readable.

use opex_types::{Amount, Distribution, Issue, Project, Receivable};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::keys::KeySpace;

/// A record kind with its own key namespace.
pub trait Record: Serialize + DeserializeOwned {
    const SPACE: KeySpace;

    /// The id this record is stored under within [`Record::SPACE`].
    fn record_id(&self) -> &str;

    fn record_key(&self) -> Vec<u8> {
        Self::SPACE.key(self.record_id())
    }
}

impl Record for Amount {
    const SPACE: KeySpace = KeySpace::Amount;

    fn record_id(&self) -> &str {
        self.entity.code()
    }
}

impl Record for Issue {
    const SPACE: KeySpace = KeySpace::Issue;

    fn record_id(&self) -> &str {
        self.project_id.as_str()
    }
}

impl Record for Project {
    const SPACE: KeySpace = KeySpace::Project;

    fn record_id(&self) -> &str {
        self.project_id.as_str()
    }
}

impl Record for Distribution {
    const SPACE: KeySpace = KeySpace::Distribution;

    fn record_id(&self) -> &str {
        self.project_id.as_str()
    }
}

impl Record for Receivable {
    const SPACE: KeySpace = KeySpace::Receivable;

    fn record_id(&self) -> &str {
        self.project_id.as_str()
    }
}

pub(crate) fn encode<R: Record>(record: &R) -> LedgerResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| {
        LedgerError::Unavailable(format!("cannot encode {}: {e}", R::SPACE.label()))
    })
}

/// Decode a stored value. A value that does not parse means the store handed
/// back something the ledger never wrote.
pub(crate) fn decode<R: Record>(key: &[u8], bytes: &[u8]) -> LedgerResult<R> {
    serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::Unavailable(format!(
            "corrupt {} record at {}: {e}",
            R::SPACE.label(),
            String::from_utf8_lossy(key)
        ))
    })
}
