//! # warden-recovery
//!
//! Point-in-time project backups and rollback for Warden.
//!
//! A backup is a filtered copy of the project tree (no VCS metadata, caches,
//! or build output) with a metadata record holding its size, file count, and
//! a SHA-256 content digest for later verification. Rollback either restores
//! a backup over the project or runs `git reset --hard`.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use warden_recovery::{RecoveryConfig, RecoveryManager};
//!
//! let recovery = RecoveryManager::open(RecoveryConfig::with_root("/tmp/backups")).unwrap();
//! let id = recovery
//!     .create_backup(Path::new("/work/proj"), None, Some("before refactor"))
//!     .unwrap();
//! assert!(recovery.verify_backup(&id).unwrap());
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod manager;
pub mod vcs;

pub use backup::{BackupMetadata, RollbackMethod};
pub use config::RecoveryConfig;
pub use error::RecoveryError;
pub use manager::RecoveryManager;
pub use vcs::DEFAULT_ROLLBACK_REVISION;
