//! # warden-sandbox
//!
//! Disposable, bounded execution directories for agent work.
//!
//! [`SandboxManager::create_sandbox`] returns a [`SandboxGuard`]; the
//! sandbox lives exactly as long as the guard. Commands spawned through
//! [`SandboxGuard::command`] or [`SandboxGuard::run`] carry CPU-time and
//! address-space ceilings in the child process only.
//!
//! This is a best-effort containment layer, not a hardened kernel sandbox:
//! there is no filesystem or network isolation beyond the working directory.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use warden_sandbox::{SandboxConfig, SandboxManager};
//!
//! let manager = SandboxManager::new(SandboxConfig::with_root("/tmp/warden-sandboxes"));
//! let output = manager
//!     .with_sandbox("agent-1", None, |sandbox| sandbox.run("ls", &["-la"], None))
//!     .unwrap();
//! assert_eq!(manager.active_count(), 0);
//! ```

pub mod config;
pub mod error;
pub mod limits;
pub mod sandbox;

pub use config::SandboxConfig;
pub use error::SandboxError;
pub use limits::ResourceLimits;
pub use sandbox::{Sandbox, SandboxGuard, SandboxManager, SandboxedExecution, SANDBOX_ENV};
