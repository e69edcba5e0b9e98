use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier shared by every record that belongs to one project.
///
/// Any non-empty string without control characters is accepted. Keys are
/// built as `"<kind>/<id>"`, so a `/` inside an id stays inside its own
/// kind's key space.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Validate and wrap a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        if raw.is_empty() {
            return Err(TypeError::Empty { field: "project_id" });
        }
        if raw.chars().any(char::is_control) {
            return Err(TypeError::InvalidProjectId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
