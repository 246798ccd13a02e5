//! # warden-audit
//!
//! Append-only decision trail for Warden.
//!
//! Every allow/deny decision, security violation, and observed command
//! execution is recorded as an [`AuditEntry`] in a JSONL (JSON Lines) file.
//! Entries are hash-chained; with a chain key the links are HMAC-SHA256 so
//! the log cannot be silently rewritten by anyone without the key.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use warden_audit::{AuditLogger, AuditQuery};
//!
//! let log = AuditLogger::open("/tmp/audit.jsonl").unwrap();
//! log.log_operation("agent-1", "ls -la", true, "allowed", serde_json::Value::Null)
//!     .unwrap();
//! let recent = log.query(&AuditQuery::new().agent("agent-1").limit(10)).unwrap();
//! assert_eq!(recent.entries.len(), 1);
//! ```

pub mod entry;
pub mod error;
pub mod hasher;
pub mod logger;
pub mod query;

pub use entry::{AuditEntry, AuditEventType, AuditSeverity};
pub use error::AuditError;
pub use logger::{truncate_output, verify_chain, AuditLogger, MAX_OUTPUT_CHARS};
pub use query::{read_filtered, AuditQuery, AuditQueryResult};
