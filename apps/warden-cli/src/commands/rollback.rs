// rollback.rs — `warden rollback`: git reset --hard to an earlier revision.

use std::path::Path;

use serde_json::json;
use warden_audit::{AuditEventType, AuditSeverity};
use warden_gatekeeper::WardenConfig;
use warden_recovery::DEFAULT_ROLLBACK_REVISION;

use super::open_manager;

pub fn execute(
    agent: &str,
    revision: Option<&str>,
    config: &WardenConfig,
    project_root: &Path,
) -> anyhow::Result<()> {
    let manager = open_manager(config)?;
    let head = manager
        .recovery()
        .rollback_version_control(project_root, revision)?;
    let revision = revision.unwrap_or(DEFAULT_ROLLBACK_REVISION);

    manager.audit().log_event(
        AuditEventType::Rollback,
        agent,
        &project_root.display().to_string(),
        &format!("git reset --hard {}", revision),
        json!({ "revision": revision, "head": head }),
        AuditSeverity::Warning,
    )?;
    println!("Rolled back to {} (HEAD is now {})", revision, head);
    Ok(())
}
