// error.rs — Error types for the audit subsystem.
//
// Uses `thiserror` to derive the standard Rust `Error` trait automatically.
// Each variant maps to a specific failure mode in the audit pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open or create the audit log file.
    #[error("failed to open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the log back.
    #[error("failed to read audit log at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A line of the log is not valid UTF-8.
    #[error("audit log line {line} is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    /// Failed to write an entry to the log.
    #[error("failed to append audit entry: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to serialize or deserialize an entry (malformed JSON).
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The hash chain is broken; the log has been tampered with.
    #[error("integrity check failed at line {line}: expected hash {expected}, got {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },

    /// A writer panicked while holding the log lock.
    #[error("audit log writer lock was poisoned")]
    LockPoisoned,

    /// An event type name could not be parsed.
    #[error("unknown audit event type '{0}'")]
    UnknownEventType(String),
}
