// manager.rs — RecoveryManager: backups, restore, rollback and retention.
//
// The backup index is loaded from the metadata files at open and kept in an
// RwLock; disk is always written first, then the index.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use warden_workspace::{clear_dir, copy_tree, is_empty_dir, tree_digest, ExcludePatterns};

use crate::backup::{
    generate_id, metadata_path, read_metadata, validate_name, write_metadata, BackupMetadata,
    RollbackMethod,
};
use crate::config::RecoveryConfig;
use crate::error::RecoveryError;
use crate::vcs::{self, DEFAULT_ROLLBACK_REVISION};

/// Creates and restores project backups and rolls back via git.
pub struct RecoveryManager {
    config: RecoveryConfig,
    index: RwLock<HashMap<String, BackupMetadata>>,
}

impl RecoveryManager {
    /// Open the backup store, creating the root if needed and indexing any
    /// existing metadata records. Unreadable records are skipped with a
    /// warning.
    pub fn open(config: RecoveryConfig) -> Result<Self, RecoveryError> {
        let root = &config.backup_root;
        fs::create_dir_all(root).map_err(|source| RecoveryError::IoError {
            path: root.clone(),
            source,
        })?;

        let mut index = HashMap::new();
        let entries = fs::read_dir(root).map_err(|source| RecoveryError::IoError {
            path: root.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| RecoveryError::IoError {
                path: root.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match read_metadata(&path) {
                Ok(meta) => {
                    index.insert(meta.backup_id.clone(), meta);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping backup record"),
            }
        }

        tracing::debug!(root = %root.display(), backups = index.len(), "backup store opened");
        Ok(Self {
            config,
            index: RwLock::new(index),
        })
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Copy `project` (minus VCS metadata and build noise) into a new backup.
    ///
    /// With `name`, the backup id is the name itself; it must not contain
    /// path separators or `..` and must not already exist. Returns the id.
    pub fn create_backup(
        &self,
        project: &Path,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<String, RecoveryError> {
        if !project.is_dir() {
            return Err(RecoveryError::ProjectNotFound {
                path: project.to_path_buf(),
            });
        }
        let now = Utc::now();
        let id = match name {
            Some(name) => {
                validate_name(name)?;
                name.to_string()
            }
            None => generate_id(now),
        };

        let backup_path = self.config.backup_root.join(&id);
        let meta_path = metadata_path(&self.config.backup_root, &id);
        if self.get_backup(&id).is_some() || backup_path.exists() || meta_path.exists() {
            return Err(RecoveryError::AlreadyExists { id });
        }

        let project_path = project.canonicalize().map_err(|source| RecoveryError::IoError {
            path: project.to_path_buf(),
            source,
        })?;

        let built = copy_tree(&project_path, &backup_path, &ExcludePatterns::load(&project_path))
            .map_err(RecoveryError::from)
            .and_then(|_| tree_digest(&backup_path, &ExcludePatterns::none()).map_err(RecoveryError::from))
            .and_then(|digest| {
                let meta = BackupMetadata {
                    backup_id: id.clone(),
                    backup_path: backup_path.clone(),
                    project_path: project_path.clone(),
                    created_at: now,
                    description: description.map(str::to_string),
                    size_bytes: digest.size_bytes,
                    file_count: digest.file_count,
                    content_digest: digest.digest,
                };
                write_metadata(&meta_path, &meta)?;
                Ok(meta)
            });

        let meta = match built {
            Ok(meta) => meta,
            Err(e) => {
                self.remove_backup_files(&id);
                return Err(e);
            }
        };

        tracing::info!(
            backup_id = %id,
            project = %project_path.display(),
            files = meta.file_count,
            bytes = meta.size_bytes,
            "backup created"
        );
        self.index
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), meta);
        Ok(id)
    }

    /// Copy a backup back out.
    ///
    /// The destination defaults to the backup's original project. A
    /// non-empty destination requires `overwrite`, which first removes every
    /// entry the backup would not have captured (so `.git/` and other
    /// excluded directories survive), then copies the backup in.
    pub fn restore_backup(
        &self,
        backup_id: &str,
        restore_path: Option<&Path>,
        overwrite: bool,
    ) -> Result<(), RecoveryError> {
        let meta = self.get_backup(backup_id).ok_or_else(|| RecoveryError::NotFound {
            id: backup_id.to_string(),
        })?;
        if !meta.backup_path.is_dir() {
            return Err(RecoveryError::NotFound {
                id: backup_id.to_string(),
            });
        }

        let dest: PathBuf = restore_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| meta.project_path.clone());

        if !is_empty_dir(&dest)? {
            if !overwrite {
                return Err(RecoveryError::DestinationNotEmpty { path: dest });
            }
            clear_dir(&dest, &ExcludePatterns::load(&dest))?;
        }
        copy_tree(&meta.backup_path, &dest, &ExcludePatterns::none())?;

        tracing::info!(backup_id, dest = %dest.display(), overwrite, "backup restored");
        Ok(())
    }

    /// `git reset --hard <revision>` in `project` (default `HEAD~1`).
    /// Returns the new HEAD commit.
    pub fn rollback_version_control(
        &self,
        project: &Path,
        revision: Option<&str>,
    ) -> Result<String, RecoveryError> {
        if !project.is_dir() {
            return Err(RecoveryError::ProjectNotFound {
                path: project.to_path_buf(),
            });
        }
        let revision = revision.unwrap_or(DEFAULT_ROLLBACK_REVISION);
        let head = vcs::reset_hard(project, revision)?;
        tracing::info!(project = %project.display(), revision, head = %head, "version control rolled back");
        Ok(head)
    }

    /// Whether a backup is intact: its metadata and tree exist and the tree
    /// still hashes to the recorded digest. Unknown ids are not intact.
    pub fn verify_backup(&self, backup_id: &str) -> Result<bool, RecoveryError> {
        let Some(meta) = self.get_backup(backup_id) else {
            return Ok(false);
        };
        if !metadata_path(&self.config.backup_root, backup_id).is_file()
            || !meta.backup_path.is_dir()
        {
            return Ok(false);
        }
        let digest = tree_digest(&meta.backup_path, &ExcludePatterns::none())?;
        let intact = digest.digest == meta.content_digest && digest.file_count == meta.file_count;
        if !intact {
            tracing::warn!(backup_id, "backup content does not match its digest");
        }
        Ok(intact)
    }

    /// All backups, newest first.
    pub fn list_backups(&self) -> Vec<BackupMetadata> {
        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        let mut backups: Vec<BackupMetadata> = index.values().cloned().collect();
        backups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.backup_id.cmp(&a.backup_id))
        });
        backups
    }

    pub fn get_backup(&self, backup_id: &str) -> Option<BackupMetadata> {
        self.index
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(backup_id)
            .cloned()
    }

    /// Delete all but the `keep` newest backups. Returns the deleted ids,
    /// oldest first.
    pub fn cleanup_old_backups(&self, keep: usize) -> Result<Vec<String>, RecoveryError> {
        let mut doomed: Vec<BackupMetadata> = self.list_backups().into_iter().skip(keep).collect();
        doomed.reverse();

        let mut deleted = Vec::with_capacity(doomed.len());
        for meta in doomed {
            if meta.backup_path.exists() {
                fs::remove_dir_all(&meta.backup_path).map_err(|source| RecoveryError::IoError {
                    path: meta.backup_path.clone(),
                    source,
                })?;
            }
            let meta_path = metadata_path(&self.config.backup_root, &meta.backup_id);
            match fs::remove_file(&meta_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(RecoveryError::IoError {
                        path: meta_path,
                        source,
                    })
                }
            }
            self.index
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&meta.backup_id);
            tracing::info!(backup_id = %meta.backup_id, "old backup deleted");
            deleted.push(meta.backup_id);
        }
        Ok(deleted)
    }

    /// Back up `project` ahead of a destructive operation, then apply the
    /// retention limit. `None` when automatic backups are disabled.
    pub fn auto_backup_before_destructive_operation(
        &self,
        project: &Path,
        operation: &str,
    ) -> Result<Option<String>, RecoveryError> {
        if !self.config.auto_backup {
            return Ok(None);
        }
        let description = format!("automatic backup before: {}", operation);
        let id = self.create_backup(project, None, Some(&description))?;
        self.cleanup_old_backups(self.config.keep_backups.max(1))?;
        Ok(Some(id))
    }

    /// Undo a failed operation: overwrite-restore from `backup_id` when
    /// given, otherwise roll git back one commit.
    pub fn auto_rollback_on_failure(
        &self,
        project: &Path,
        backup_id: Option<&str>,
    ) -> Result<RollbackMethod, RecoveryError> {
        match backup_id {
            Some(id) => {
                self.restore_backup(id, Some(project), true)?;
                Ok(RollbackMethod::Backup {
                    backup_id: id.to_string(),
                })
            }
            None => {
                self.rollback_version_control(project, None)?;
                Ok(RollbackMethod::Git {
                    revision: DEFAULT_ROLLBACK_REVISION.to_string(),
                })
            }
        }
    }

    /// Best-effort removal of a half-created backup.
    fn remove_backup_files(&self, id: &str) {
        let backup_path = self.config.backup_root.join(id);
        if backup_path.exists() {
            if let Err(e) = fs::remove_dir_all(&backup_path) {
                tracing::warn!(path = %backup_path.display(), error = %e, "failed to remove partial backup");
            }
        }
        let meta_path = metadata_path(&self.config.backup_root, id);
        if meta_path.exists() {
            if let Err(e) = fs::remove_file(&meta_path) {
                tracing::warn!(path = %meta_path.display(), error = %e, "failed to remove partial backup record");
            }
        }
    }
}

impl std::fmt::Debug for RecoveryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryManager")
            .field("config", &self.config)
            .finish()
    }
}
