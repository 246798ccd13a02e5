// error.rs — Error types for tree copying and hashing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while copying, walking, or hashing a tree.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source of a copy is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The destination of a copy lies inside its source.
    #[error("cannot copy {src} into its own subtree {dst}")]
    NestedDestination { src: PathBuf, dst: PathBuf },
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::IoError {
            path: path.into(),
            source,
        }
    }
}
