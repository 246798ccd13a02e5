// entry.rs — Audit entry data model.
//
// Every decision the governor makes (allow, deny, threat) and every command
// it observes being executed is recorded as an AuditEntry. Entries form a
// chain: each one carries a `previous_hash` linking it to the prior line,
// enabling tamper detection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuditError;

/// What kind of event an entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// The gatekeeper allowed an operation.
    OperationAllowed,
    /// The gatekeeper denied an operation (policy or threat).
    OperationBlocked,
    /// A denial's detail record: which rule or threat caused it.
    SecurityViolation,
    /// A command ran; its exit status and (truncated) output.
    CommandExecution,
    SandboxCreated,
    SandboxDestroyed,
    BackupCreated,
    BackupRestored,
    Rollback,
    /// An operational failure worth keeping on the record.
    Error,
}

impl AuditEventType {
    pub const ALL: &'static [AuditEventType] = &[
        AuditEventType::OperationAllowed,
        AuditEventType::OperationBlocked,
        AuditEventType::SecurityViolation,
        AuditEventType::CommandExecution,
        AuditEventType::SandboxCreated,
        AuditEventType::SandboxDestroyed,
        AuditEventType::BackupCreated,
        AuditEventType::BackupRestored,
        AuditEventType::Rollback,
        AuditEventType::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::OperationAllowed => "operation_allowed",
            AuditEventType::OperationBlocked => "operation_blocked",
            AuditEventType::SecurityViolation => "security_violation",
            AuditEventType::CommandExecution => "command_execution",
            AuditEventType::SandboxCreated => "sandbox_created",
            AuditEventType::SandboxDestroyed => "sandbox_destroyed",
            AuditEventType::BackupCreated => "backup_created",
            AuditEventType::BackupRestored => "backup_restored",
            AuditEventType::Rollback => "rollback",
            AuditEventType::Error => "error",
        }
    }

    /// Whether this is the terminal allow/deny record for an operation.
    pub fn is_terminal_decision(&self) -> bool {
        matches!(
            self,
            AuditEventType::OperationAllowed | AuditEventType::OperationBlocked
        )
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEventType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditEventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuditError::UnknownEventType(s.to_string()))
    }
}

/// How loudly an entry should be surfaced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditSeverity::Info => "info",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Error => "error",
            AuditSeverity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A single audit entry: one line in the JSONL audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry.
    pub entry_id: Uuid,

    /// When this entry was recorded (UTC).
    pub timestamp: DateTime<Utc>,

    pub event_type: AuditEventType,

    /// Which agent the event concerns.
    pub agent_id: String,

    /// The operation text (command line, path, or description).
    pub operation: String,

    /// Human-readable outcome ("allowed", a denial reason, "exit 0", ...).
    pub result: String,

    /// For decision entries: whether the operation was allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<bool>,

    pub severity: AuditSeverity,

    /// Arbitrary additional data.
    #[serde(default)]
    pub details: serde_json::Value,

    /// Hash of the previous line in the log (for tamper detection).
    /// The first entry in the log has this set to None.
    pub previous_hash: Option<String>,
}

impl AuditEntry {
    /// Create a new entry with the current timestamp and a random UUID.
    pub fn new(
        event_type: AuditEventType,
        agent_id: impl Into<String>,
        operation: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            agent_id: agent_id.into(),
            operation: operation.into(),
            result: result.into(),
            allowed: None,
            severity: AuditSeverity::Info,
            details: serde_json::Value::Null,
            previous_hash: None,
        }
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_allowed(mut self, allowed: bool) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
