// error.rs — Error types for the sandbox subsystem.

use std::path::PathBuf;
use thiserror::Error;
use warden_workspace::WorkspaceError;

/// Errors that can occur while creating, using, or tearing down a sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// A sandbox directory could not be created or removed.
    #[error("sandbox I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The project to snapshot does not exist or is not a directory.
    #[error("project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// Copying the project snapshot into the sandbox failed.
    #[error("failed to snapshot project into sandbox: {0}")]
    Snapshot(#[from] WorkspaceError),

    /// The child process could not be started.
    #[error("failed to spawn '{program}' in sandbox: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Waiting on or collecting output from the child failed.
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}
