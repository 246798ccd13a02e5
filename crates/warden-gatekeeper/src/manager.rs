// manager.rs — SecurityManager: the single entry point agents go through.
//
// validate_operation:
//   validator → (soft denial relaxation) → threat monitor → threat override
//   → audit (terminal entry, plus a violation entry on denial) → Decision
//
// The sandbox and recovery managers are exposed for callers to use around
// risky execution windows; the helpers here wrap them with audit entries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use warden_audit::{
    AuditEntry, AuditEventType, AuditLogger, AuditQuery, AuditQueryResult, AuditSeverity,
};
use warden_monitor::{Clock, SecurityThreat, ThreatFilter, ThreatMonitor};
use warden_policy::{Operation, Severity, ValidationResult, Validator};
use warden_recovery::{RecoveryManager, RollbackMethod};
use warden_sandbox::{SandboxManager, SandboxedExecution};

use crate::config::WardenConfig;
use crate::error::WardenError;

/// The gatekeeper's answer for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub result: ValidationResult,
    /// Set when the threat monitor flagged this attempt. A decision with a
    /// threat is always a denial.
    pub threat: Option<SecurityThreat>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.result.allowed
    }
}

/// Owns one of each collaborator and mediates every agent operation.
///
/// Share across threads with `Arc<SecurityManager>`; every method takes
/// `&self`.
pub struct SecurityManager {
    config: WardenConfig,
    validator: Validator,
    monitor: ThreatMonitor,
    audit: AuditLogger,
    sandbox: SandboxManager,
    recovery: RecoveryManager,
}

impl SecurityManager {
    /// Build every collaborator from `config`.
    ///
    /// Fails on a missing or short master key, an empty root list, or an
    /// audit log / backup store that cannot be opened.
    pub fn new(config: WardenConfig) -> Result<Self, WardenError> {
        let key = config.master_key()?;
        // Agents may read Warden's own state but never rewrite it.
        let validator = Validator::new(config.policy.validator.clone().with_protected_paths([
            config.audit.log_path.clone(),
            config.recovery.backup_root.clone(),
            config.sandbox.root.clone(),
        ]))?;
        let monitor = ThreatMonitor::new(config.monitor.clone());
        let audit = AuditLogger::open(&config.audit.log_path)?
            .with_chain_key(&key)
            .with_console_mirror(config.audit.console_mirror);
        let sandbox = SandboxManager::new(config.sandbox.clone());
        let recovery = RecoveryManager::open(config.recovery.clone())?;

        tracing::info!(
            roots = ?validator.allowed_roots(),
            audit_log = %audit.path().display(),
            "security manager ready"
        );
        Ok(Self {
            config,
            validator,
            monitor,
            audit,
            sandbox,
            recovery,
        })
    }

    /// Replace the threat monitor's clock (deterministic replays, tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.monitor = ThreatMonitor::new(self.config.monitor.clone()).with_clock(clock);
        self
    }

    /// Replace the threat monitor, e.g. to attach an escalation handler.
    pub fn with_monitor(mut self, monitor: ThreatMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Decide whether `agent_id` may perform `operation`, and record it.
    ///
    /// Every call writes exactly one terminal audit entry whose `allowed`
    /// matches the returned decision. Audit write failures are errors: an
    /// operation that cannot be recorded is not decided.
    pub fn validate_operation(
        &self,
        agent_id: &str,
        operation: &Operation,
    ) -> Result<Decision, WardenError> {
        let mut result = self.validator.validate_operation(operation);
        if result.is_soft_denial() && !self.config.policy.enforce_soft_denials {
            result = ValidationResult {
                allowed: true,
                reason: result.reason,
                severity: Severity::Warning,
            };
        }

        // Denied attempts are fed too, so failure-pattern detectors see them.
        let analysis = self.monitor.analyze_operation(
            agent_id,
            operation.text(),
            result.allowed,
            operation.kind(),
            json!({ "reason": result.reason, "severity": result.severity }),
        );
        let threat = analysis.threat;

        if result.allowed {
            if let Some(threat) = &threat {
                result = ValidationResult::deny(threat.description.clone(), Severity::Error);
            }
        }

        let described = operation.describe();
        let threat_json = match &threat {
            Some(t) => serde_json::to_value(t).unwrap_or_else(|_| json!(t.description)),
            None => serde_json::Value::Null,
        };

        self.audit.log_operation(
            agent_id,
            &described,
            result.allowed,
            &result.reason,
            json!({
                "kind": operation.kind(),
                "severity": result.severity,
                "threat_id": threat.as_ref().map(|t| t.threat_id.to_string()),
            }),
        )?;

        if !result.allowed {
            tracing::debug!(agent_id, operation = %described, reason = %result.reason, "operation denied");
            self.audit.log_security_violation(
                agent_id,
                &described,
                &result.reason,
                json!({ "severity": result.severity, "threat": threat_json }),
            )?;
        }

        Ok(Decision { result, threat })
    }

    /// Record a finished command, with output truncated for the log.
    pub fn record_command_execution(
        &self,
        agent_id: &str,
        command: &str,
        execution: &SandboxedExecution,
    ) -> Result<AuditEntry, WardenError> {
        Ok(self.audit.log_command_execution(
            agent_id,
            command,
            execution.exit_code,
            &execution.stdout,
            &execution.stderr,
            execution.duration,
        )?)
    }

    /// Run one command in a fresh sandbox, auditing the sandbox lifecycle
    /// and the execution. The sandbox is gone when this returns.
    pub fn run_sandboxed(
        &self,
        agent_id: &str,
        project: Option<&Path>,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<SandboxedExecution, WardenError> {
        let guard = self.sandbox.create_sandbox(agent_id, project)?;
        let sandbox_id = guard.id().to_string();
        self.audit.log_event(
            AuditEventType::SandboxCreated,
            agent_id,
            &sandbox_id,
            "created",
            json!({
                "path": guard.path(),
                "files_copied": guard.sandbox().files_copied,
            }),
            AuditSeverity::Info,
        )?;

        let command_line = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let run = guard.run(program, args, timeout);
        let closed = guard.close();

        self.audit.log_event(
            AuditEventType::SandboxDestroyed,
            agent_id,
            &sandbox_id,
            if closed.is_ok() { "destroyed" } else { "cleanup failed" },
            serde_json::Value::Null,
            if closed.is_ok() {
                AuditSeverity::Info
            } else {
                AuditSeverity::Error
            },
        )?;

        let execution = run?;
        self.record_command_execution(agent_id, &command_line, &execution)?;
        closed?;
        Ok(execution)
    }

    /// Back up `project` ahead of a destructive `operation` when automatic
    /// backups are enabled. A failed backup is an error; the destructive
    /// step must not proceed.
    pub fn backup_before(
        &self,
        agent_id: &str,
        project: &Path,
        operation: &str,
    ) -> Result<Option<String>, WardenError> {
        let backup_id = self
            .recovery
            .auto_backup_before_destructive_operation(project, operation)?;
        if let Some(id) = &backup_id {
            self.audit.log_event(
                AuditEventType::BackupCreated,
                agent_id,
                operation,
                id,
                json!({ "backup_id": id, "project": project }),
                AuditSeverity::Info,
            )?;
        }
        Ok(backup_id)
    }

    /// Undo a failed operation (backup restore or git rollback) and audit it.
    pub fn rollback_after_failure(
        &self,
        agent_id: &str,
        project: &Path,
        backup_id: Option<&str>,
    ) -> Result<RollbackMethod, WardenError> {
        let method = self.recovery.auto_rollback_on_failure(project, backup_id)?;
        let event_type = match method {
            RollbackMethod::Backup { .. } => AuditEventType::BackupRestored,
            RollbackMethod::Git { .. } => AuditEventType::Rollback,
        };
        self.audit.log_event(
            event_type,
            agent_id,
            &project.display().to_string(),
            &method.to_string(),
            serde_json::to_value(&method).unwrap_or(serde_json::Value::Null),
            AuditSeverity::Warning,
        )?;
        Ok(method)
    }

    pub fn audit_logs(&self, query: &AuditQuery) -> Result<AuditQueryResult, WardenError> {
        Ok(self.audit.query(query)?)
    }

    pub fn detected_threats(&self, filter: &ThreatFilter) -> Vec<SecurityThreat> {
        self.monitor.detected_threats(filter)
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn monitor(&self) -> &ThreatMonitor {
        &self.monitor
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn sandbox(&self) -> &SandboxManager {
        &self.sandbox
    }

    pub fn recovery(&self) -> &RecoveryManager {
        &self.recovery
    }
}
