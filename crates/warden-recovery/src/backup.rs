// backup.rs — Backup metadata records and id rules.
//
// Each backup is a directory `<backup_root>/<id>/` plus a sibling
// `<backup_root>/<id>.json` metadata file, so the store can be inspected
// and pruned by hand.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecoveryError;

/// Everything known about one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub backup_id: String,
    /// Where the copied tree lives.
    pub backup_path: PathBuf,
    /// The project the tree was copied from (default restore target).
    pub project_path: PathBuf,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    pub size_bytes: u64,
    pub file_count: u64,
    /// SHA-256 over the backup tree's paths and contents.
    pub content_digest: String,
}

/// How an automatic rollback was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RollbackMethod {
    /// The project was overwritten from a backup.
    Backup { backup_id: String },
    /// `git reset --hard` to the given revision.
    Git { revision: String },
}

impl std::fmt::Display for RollbackMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackMethod::Backup { backup_id } => write!(f, "restored backup {}", backup_id),
            RollbackMethod::Git { revision } => write!(f, "git reset --hard {}", revision),
        }
    }
}

/// Validate a caller-chosen backup name for use as an id.
pub fn validate_name(name: &str) -> Result<(), RecoveryError> {
    let invalid = |reason: &str| RecoveryError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name contains a path separator"));
    }
    if name.contains("..") {
        return Err(invalid("name contains '..'"));
    }
    if name.starts_with('.') {
        return Err(invalid("name starts with '.'"));
    }
    if name.ends_with(".json") {
        return Err(invalid("name ends with '.json'"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("name contains control characters"));
    }
    Ok(())
}

/// A fresh id: sortable timestamp plus a random suffix.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("backup-{}-{}", now.format("%Y%m%d-%H%M%S"), &suffix[..8])
}

pub(crate) fn metadata_path(backup_root: &Path, id: &str) -> PathBuf {
    backup_root.join(format!("{}.json", id))
}

pub(crate) fn write_metadata(path: &Path, meta: &BackupMetadata) -> Result<(), RecoveryError> {
    let json = serde_json::to_string_pretty(meta).map_err(|source| RecoveryError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    // Write-then-rename so a crash never leaves a truncated record.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| RecoveryError::IoError {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| RecoveryError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_metadata(path: &Path) -> Result<BackupMetadata, RecoveryError> {
    let json = fs::read_to_string(path).map_err(|source| RecoveryError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| RecoveryError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}
