// result.rs — Outcome of a policy evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a validation outcome is.
///
/// Ordered so `Severity::Warning < Severity::Error` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// The result of validating one operation.
///
/// A value type: build it with [`ValidationResult::allow`] or
/// [`ValidationResult::deny`] and never mutate it afterwards. Callers must
/// branch on [`ValidationResult::is_allowed`], not on the reason text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub allowed: bool,
    pub reason: String,
    pub severity: Severity,
}

impl ValidationResult {
    /// An allowed outcome with `Info` severity.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            severity: Severity::Info,
        }
    }

    /// A denied outcome.
    pub fn deny(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            severity,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// A denial that callers may choose to treat as advisory.
    pub fn is_soft_denial(&self) -> bool {
        !self.allowed && self.severity == Severity::Warning
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "allowed" } else { "denied" };
        write!(f, "{} ({}): {}", verdict, self.severity, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_flag_drives_truthiness() {
        assert!(ValidationResult::allow("ok").is_allowed());
        // A reassuring reason does not make a denial truthy.
        assert!(!ValidationResult::deny("looks fine", Severity::Info).is_allowed());
    }

    #[test]
    fn only_warning_denials_are_soft() {
        assert!(ValidationResult::deny("generic", Severity::Warning).is_soft_denial());
        assert!(!ValidationResult::deny("rm -rf", Severity::Error).is_soft_denial());
        assert!(!ValidationResult::allow("ok").is_soft_denial());
    }

    #[test]
    fn severity_serializes_as_snake_case() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
