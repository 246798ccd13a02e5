// error.rs — Error types for backup, restore and rollback.
//
// Recovery failures are always surfaced to the caller; nothing in this
// crate swallows an error to keep going.

use std::path::PathBuf;
use thiserror::Error;
use warden_workspace::WorkspaceError;

#[derive(Debug, Error)]
pub enum RecoveryError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A metadata record could not be read or written.
    #[error("backup metadata error at {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Copying or hashing a tree failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The project to back up or roll back does not exist.
    #[error("project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// A caller-supplied backup name is unusable as an id.
    #[error("invalid backup name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("backup '{id}' already exists")]
    AlreadyExists { id: String },

    #[error("backup '{id}' not found")]
    NotFound { id: String },

    /// Restoring into a non-empty directory without `overwrite`.
    #[error("restore destination {path} is not empty (use overwrite)")]
    DestinationNotEmpty { path: PathBuf },

    /// A revision that git would parse as an option.
    #[error("invalid revision '{revision}'")]
    InvalidRevision { revision: String },

    /// git could not be started at all.
    #[error("failed to run git: {source}")]
    GitUnavailable { source: std::io::Error },

    /// git ran and reported failure.
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },
}
