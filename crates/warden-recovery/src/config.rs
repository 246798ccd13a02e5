// config.rs — Recovery settings, loaded from the `[recovery]` section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Directory holding `<id>/` backup trees and `<id>.json` metadata.
    #[serde(default = "default_backup_root")]
    pub backup_root: PathBuf,

    /// Take a backup before operations flagged as destructive.
    #[serde(default = "default_auto_backup")]
    pub auto_backup: bool,

    /// Backups kept after an automatic backup; older ones are deleted.
    #[serde(default = "default_keep_backups")]
    pub keep_backups: usize,
}

fn default_backup_root() -> PathBuf {
    PathBuf::from(".warden/backups")
}

fn default_auto_backup() -> bool {
    true
}

fn default_keep_backups() -> usize {
    10
}

impl RecoveryConfig {
    pub fn with_root(backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            ..Self::default()
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            backup_root: default_backup_root(),
            auto_backup: default_auto_backup(),
            keep_backups: default_keep_backups(),
        }
    }
}
