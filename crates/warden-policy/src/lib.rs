//! # warden-policy
//!
//! Rule-based policy validator for Warden.
//!
//! The [`Validator`] answers "is this operation allowed?" for every shell
//! command, file access, and git invocation an agent attempts. It is a pure
//! rule evaluator: static configuration in, [`ValidationResult`] out, no
//! hidden state.
//!
//! ## Key invariants
//!
//! - **First deny wins**: checks run in a fixed order; the first one that
//!   denies is terminal. No match means allowed.
//! - **Canonical containment**: file paths are resolved to canonical
//!   absolute form and must lie inside an allowed project root. The literal
//!   presence of `..` is never the deciding factor.
//! - **Soft denials**: a generic commit message is denied with
//!   [`Severity::Warning`]; everything else denies with
//!   [`Severity::Error`].
//!
//! ## Quick Example
//!
//! ```rust
//! use warden_policy::{Operation, Validator, ValidatorConfig};
//!
//! let validator = Validator::new(ValidatorConfig::with_roots(["/work/proj"])).unwrap();
//! assert!(!validator.validate_operation(&Operation::command("rm -rf /tmp/x")).allowed);
//! assert!(validator.validate_operation(&Operation::command("ls -la")).allowed);
//! ```

pub mod error;
pub mod git;
pub mod operation;
pub mod path;
pub mod result;
pub mod rules;
pub mod sanitize;
pub mod validator;

pub use error::PolicyError;
pub use operation::{Operation, OperationKind, OperationRequest};
pub use result::{Severity, ValidationResult};
pub use sanitize::sanitize_input;
pub use validator::{EvaluationStep, EvaluationTrace, Validator, ValidatorConfig};
