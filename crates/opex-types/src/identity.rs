//! Caller identity for audit logging.
//!
//! The ledger records who invoked an operation but never decides anything
//! based on it. Credential parsing belongs to whatever hosts the ledger; it
//! hands the core a [`CallerIdentity`] that already knows the name.

use std::fmt;

/// Capability that names the caller of the current operation.
pub trait CallerIdentity: Send + Sync {
    /// Display name of the caller, used only in log records.
    fn current_caller(&self) -> String;
}

/// A caller whose name is known up front.
#[derive(Clone, PartialEq, Eq)]
pub struct FixedCaller(String);

impl FixedCaller {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl CallerIdentity for FixedCaller {
    fn current_caller(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Debug for FixedCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedCaller({})", self.0)
    }
}

/// Used when the host supplies no caller name.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousCaller;

impl CallerIdentity for AnonymousCaller {
    fn current_caller(&self) -> String {
        "anonymous".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_caller_reports_name() {
        let caller = FixedCaller::new("bk-operator");
        assert_eq!(caller.current_caller(), "bk-operator");
    }

    #[test]
    fn anonymous_caller() {
        assert_eq!(AnonymousCaller.current_caller(), "anonymous");
    }

    #[test]
    fn usable_as_trait_object() {
        let callers: Vec<Box<dyn CallerIdentity>> =
            vec![Box::new(FixedCaller::new("a")), Box::new(AnonymousCaller)];
        let names: Vec<String> = callers.iter().map(|c| c.current_caller()).collect();
        assert_eq!(names, vec!["a", "anonymous"]);
    }
}
