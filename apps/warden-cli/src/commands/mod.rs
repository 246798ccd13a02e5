pub mod audit;
pub mod backup;
pub mod check;
pub mod replay;
pub mod rollback;
pub mod sandbox;

use anyhow::Context;
use warden_gatekeeper::{Decision, SecurityManager, WardenConfig};
use warden_policy::Operation;

/// Build the full gatekeeper (requires the audit master key).
pub fn open_manager(config: &WardenConfig) -> anyhow::Result<SecurityManager> {
    SecurityManager::new(config.clone()).context("failed to start the security manager")
}

/// One-line verdict plus indented reason and threat.
pub fn format_decision(operation: &Operation, decision: &Decision) -> String {
    let verdict = if decision.is_allowed() {
        "ALLOWED"
    } else {
        "DENIED"
    };
    let mut out = format!(
        "{:<8} {}\n  reason:   {} ({})",
        verdict,
        operation.describe(),
        decision.result.reason,
        decision.result.severity
    );
    if let Some(threat) = &decision.threat {
        out.push_str(&format!(
            "\n  threat:   {} [{}] {}",
            threat.threat_type, threat.threat_level, threat.description
        ));
    }
    out
}
