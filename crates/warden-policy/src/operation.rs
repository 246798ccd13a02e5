// operation.rs — The unit of work submitted for validation.
//
// An `Operation` is a closed set of variants, one per kind of action an
// agent can attempt. Callers that only have a loose description (e.g., a
// JSON line from an agent wrapper) build an `OperationRequest` and convert
// it; kind detection from field presence happens only at that edge.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// The kind of an operation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Command,
    FileRead,
    FileWrite,
    FileDelete,
    GitOperation,
}

impl OperationKind {
    /// Whether this kind removes data.
    pub fn is_delete(&self) -> bool {
        matches!(self, OperationKind::FileDelete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Command => "command",
            OperationKind::FileRead => "file_read",
            OperationKind::FileWrite => "file_write",
            OperationKind::FileDelete => "file_delete",
            OperationKind::GitOperation => "git_operation",
        };
        f.write_str(name)
    }
}

/// One attempted action. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// A shell command line.
    Command { command: String },
    /// Reading a file.
    FileRead { path: String },
    /// Creating or modifying a file.
    FileWrite { path: String },
    /// Removing a file or directory.
    FileDelete { path: String },
    /// A git invocation (e.g., "git push origin main").
    Git { command: String },
}

impl Operation {
    pub fn command(command: impl Into<String>) -> Self {
        Operation::Command {
            command: command.into(),
        }
    }

    pub fn file_read(path: impl Into<String>) -> Self {
        Operation::FileRead { path: path.into() }
    }

    pub fn file_write(path: impl Into<String>) -> Self {
        Operation::FileWrite { path: path.into() }
    }

    pub fn file_delete(path: impl Into<String>) -> Self {
        Operation::FileDelete { path: path.into() }
    }

    pub fn git(command: impl Into<String>) -> Self {
        Operation::Git {
            command: command.into(),
        }
    }

    /// The kind tag for this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Command { .. } => OperationKind::Command,
            Operation::FileRead { .. } => OperationKind::FileRead,
            Operation::FileWrite { .. } => OperationKind::FileWrite,
            Operation::FileDelete { .. } => OperationKind::FileDelete,
            Operation::Git { .. } => OperationKind::GitOperation,
        }
    }

    /// The raw text of the operation (command line or path), as recorded in
    /// history and audit entries.
    pub fn text(&self) -> &str {
        match self {
            Operation::Command { command } | Operation::Git { command } => command,
            Operation::FileRead { path }
            | Operation::FileWrite { path }
            | Operation::FileDelete { path } => path,
        }
    }

    /// A one-line description such as `file_delete: src/old.rs`.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind(), self.text())
    }
}

/// A loosely-typed operation description, as received from callers that
/// only know which fields they have.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationRequest {
    #[serde(default)]
    pub kind: Option<OperationKind>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub git_command: Option<String>,
}

impl OperationRequest {
    /// Convert into a typed `Operation`.
    ///
    /// With an explicit `kind`, the matching field must be present. Without
    /// one, the kind is inferred: `git_command` wins, then `command` (a
    /// command starting with `git ` is treated as a git operation), then
    /// `file_path` (treated as a read).
    pub fn into_operation(self) -> Result<Operation, PolicyError> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let command = non_empty(self.command);
        let file_path = non_empty(self.file_path);
        let git_command = non_empty(self.git_command);

        match self.kind {
            Some(kind) => {
                let missing = |field| PolicyError::MissingField {
                    kind: kind.to_string(),
                    field,
                };
                match kind {
                    OperationKind::Command => command
                        .map(Operation::command)
                        .ok_or_else(|| missing("command")),
                    OperationKind::FileRead => file_path
                        .map(Operation::file_read)
                        .ok_or_else(|| missing("file_path")),
                    OperationKind::FileWrite => file_path
                        .map(Operation::file_write)
                        .ok_or_else(|| missing("file_path")),
                    OperationKind::FileDelete => file_path
                        .map(Operation::file_delete)
                        .ok_or_else(|| missing("file_path")),
                    OperationKind::GitOperation => git_command
                        .or(command)
                        .map(Operation::git)
                        .ok_or_else(|| missing("git_command")),
                }
            }
            None => {
                if let Some(git) = git_command {
                    Ok(Operation::git(git))
                } else if let Some(cmd) = command {
                    if cmd.trim_start().starts_with("git ") {
                        Ok(Operation::git(cmd))
                    } else {
                        Ok(Operation::command(cmd))
                    }
                } else if let Some(path) = file_path {
                    Ok(Operation::file_read(path))
                } else {
                    Err(PolicyError::EmptyOperation)
                }
            }
        }
    }
}
