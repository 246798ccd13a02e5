// error.rs — Error types for the policy subsystem.
//
// Policy *denials* are not errors; they are `ValidationResult`s with
// `allowed == false`. These variants cover configuration mistakes and
// malformed operation requests only.

use thiserror::Error;

/// Errors that can occur while building a validator or decoding a request.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The validator was configured without any allowed project roots.
    #[error("validator requires at least one allowed project root")]
    NoAllowedRoots,

    /// A configured project root could not be resolved to an absolute path.
    #[error("invalid project root '{root}': {reason}")]
    InvalidRoot { root: String, reason: String },

    /// A built-in denylist pattern failed to compile.
    #[error("denylist rule '{name}' failed to compile: {reason}")]
    InvalidRule { name: String, reason: String },

    /// An operation request carried no command, path, or git command.
    #[error("operation request has no command, file_path, or git_command")]
    EmptyOperation,

    /// An operation request named a kind but omitted the field it needs.
    #[error("operation of kind '{kind}' is missing its '{field}' field")]
    MissingField { kind: String, field: &'static str },
}
