// error.rs — Top-level error type for the gatekeeper.
//
// Policy denials and detected threats are `Decision`s, not errors. These
// variants cover configuration mistakes and resource failures in the
// collaborators.

use std::path::PathBuf;

use thiserror::Error;
use warden_audit::AuditError;
use warden_policy::PolicyError;
use warden_recovery::RecoveryError;
use warden_sandbox::SandboxError;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `WardenConfig`.
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Neither `master_key` nor the environment variable was set.
    #[error("no audit master key: set `master_key` in the config or {env}")]
    MissingMasterKey { env: &'static str },

    #[error("audit master key is {len} bytes; at least {min} are required")]
    ShortMasterKey { len: usize, min: usize },
}
