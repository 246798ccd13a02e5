// vcs.rs — git subprocess helpers for version-control rollback.

use std::path::Path;
use std::process::Command;

use crate::error::RecoveryError;

/// Revision used when a rollback does not name one.
pub const DEFAULT_ROLLBACK_REVISION: &str = "HEAD~1";

/// Run `git <args>` in `work_dir`, returning trimmed stdout.
pub(crate) fn git_cmd(work_dir: &Path, args: &[&str]) -> Result<String, RecoveryError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(work_dir)
        .output()
        .map_err(|source| RecoveryError::GitUnavailable { source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecoveryError::Git {
            command: args.join(" "),
            message: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Reject revisions git would read as options (e.g. `--hard`, `-q`).
pub(crate) fn check_revision(revision: &str) -> Result<(), RecoveryError> {
    if revision.is_empty() || revision.starts_with('-') || revision.contains(char::is_whitespace)
    {
        return Err(RecoveryError::InvalidRevision {
            revision: revision.to_string(),
        });
    }
    Ok(())
}

/// `git reset --hard <revision>` in `project`. Returns the new HEAD.
pub(crate) fn reset_hard(project: &Path, revision: &str) -> Result<String, RecoveryError> {
    check_revision(revision)?;
    git_cmd(project, &["reset", "--hard", revision])?;
    git_cmd(project, &["rev-parse", "HEAD"])
}
