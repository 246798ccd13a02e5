//! # warden-gatekeeper
//!
//! The single front door for agent operations.
//!
//! [`SecurityManager`] owns one of each Warden collaborator (policy
//! [`Validator`](warden_policy::Validator), threat monitor, audit logger,
//! sandbox manager, recovery manager) and runs every attempted operation
//! through them in a fixed order: policy rules, then pattern detection, then
//! the audit trail. A detected threat always turns an allow into a deny.
//!
//! Configuration comes from [`WardenConfig`], normally
//! `<project>/.warden/warden.toml`.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use warden_gatekeeper::{SecurityManager, WardenConfig};
//! use warden_policy::Operation;
//!
//! let config = WardenConfig::load_for_project("/work/proj", None).unwrap();
//! let manager = SecurityManager::new(config).unwrap();
//! let decision = manager
//!     .validate_operation("agent-1", &Operation::command("cargo test"))
//!     .unwrap();
//! println!("{}", decision.result);
//! ```

pub mod config;
pub mod error;
pub mod manager;

pub use config::{
    AuditSection, PolicySection, WardenConfig, CONFIG_FILE, MASTER_KEY_ENV, MIN_MASTER_KEY_LEN,
    WARDEN_DIR,
};
pub use error::WardenError;
pub use manager::{Decision, SecurityManager};
