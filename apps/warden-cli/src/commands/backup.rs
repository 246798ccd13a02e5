// backup.rs — Backup subcommands: create, list, restore, verify, cleanup.
//
// create and restore go through the gatekeeper so they land in the audit
// trail; the read-only and housekeeping commands only need the store.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde_json::json;
use warden_audit::{AuditEventType, AuditSeverity};
use warden_gatekeeper::WardenConfig;
use warden_recovery::RecoveryManager;

use super::open_manager;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Back up the project.
    Create {
        /// Backup id to use instead of a generated one.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "cli")]
        agent: String,
    },
    /// List backups, newest first.
    List,
    /// Restore a backup.
    Restore {
        backup_id: String,
        /// Destination (defaults to the backup's original project).
        #[arg(long)]
        to: Option<PathBuf>,
        /// Replace the contents of a non-empty destination.
        #[arg(long)]
        overwrite: bool,
        #[arg(long, default_value = "cli")]
        agent: String,
    },
    /// Check a backup against its recorded digest.
    Verify { backup_id: String },
    /// Delete all but the newest backups.
    Cleanup {
        /// Backups to keep (defaults to recovery.keep_backups).
        #[arg(long)]
        keep: Option<usize>,
    },
}

pub fn execute(
    cmd: &BackupCommands,
    config: &WardenConfig,
    project_root: &Path,
) -> anyhow::Result<()> {
    match cmd {
        BackupCommands::Create {
            name,
            description,
            agent,
        } => {
            let manager = open_manager(config)?;
            let id = manager.recovery().create_backup(
                project_root,
                name.as_deref(),
                description.as_deref(),
            )?;
            manager.audit().log_event(
                AuditEventType::BackupCreated,
                agent,
                &project_root.display().to_string(),
                &id,
                json!({ "backup_id": id, "description": description }),
                AuditSeverity::Info,
            )?;
            println!("Created backup {}", id);
        }

        BackupCommands::List => {
            let recovery = RecoveryManager::open(config.recovery.clone())?;
            let backups = recovery.list_backups();
            if backups.is_empty() {
                println!("No backups.");
                return Ok(());
            }
            println!(
                "{:<36} {:<20} {:>7} {:>12}  DESCRIPTION",
                "ID", "CREATED", "FILES", "BYTES"
            );
            println!("{}", "-".repeat(90));
            for b in backups {
                println!(
                    "{:<36} {:<20} {:>7} {:>12}  {}",
                    b.backup_id,
                    b.created_at.format("%Y-%m-%d %H:%M:%S"),
                    b.file_count,
                    b.size_bytes,
                    b.description.as_deref().unwrap_or("-"),
                );
            }
        }

        BackupCommands::Restore {
            backup_id,
            to,
            overwrite,
            agent,
        } => {
            let manager = open_manager(config)?;
            manager
                .recovery()
                .restore_backup(backup_id, to.as_deref(), *overwrite)?;
            let dest = to
                .clone()
                .or_else(|| manager.recovery().get_backup(backup_id).map(|b| b.project_path))
                .unwrap_or_default();
            manager.audit().log_event(
                AuditEventType::BackupRestored,
                agent,
                &dest.display().to_string(),
                backup_id,
                json!({ "backup_id": backup_id, "overwrite": overwrite }),
                AuditSeverity::Warning,
            )?;
            println!("Restored {} into {}", backup_id, dest.display());
        }

        BackupCommands::Verify { backup_id } => {
            let recovery = RecoveryManager::open(config.recovery.clone())?;
            if recovery.verify_backup(backup_id)? {
                println!("Backup {} is intact.", backup_id);
            } else {
                anyhow::bail!("backup {} is missing or does not match its digest", backup_id);
            }
        }

        BackupCommands::Cleanup { keep } => {
            let recovery = RecoveryManager::open(config.recovery.clone())?;
            let keep = keep.unwrap_or(config.recovery.keep_backups);
            let deleted = recovery.cleanup_old_backups(keep)?;
            println!("Deleted {} backup(s), kept {}.", deleted.len(), keep);
            for id in deleted {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}
