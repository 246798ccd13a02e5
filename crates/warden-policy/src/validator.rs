// validator.rs — The rule-based policy validator.
//
// Every operation flows through an ordered list of checks. The first check
// that denies is terminal; if none deny, the operation is allowed:
//
// Commands:  empty → length → denylist → (git rules, for git commands)
// Files:     empty → critical OS paths → root containment → root deletion
//            → version-control metadata writes → protected paths
// Git:       denylist → force push → hard reset → clean → branch delete
//            → commit message
//
// The validator holds only static configuration and compiled rules. It is
// a pure function of its inputs: the same operation always yields the same
// result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::git::GitInvocation;
use crate::operation::{Operation, OperationKind};
use crate::path::{resolve_path, resolve_root};
use crate::result::{Severity, ValidationResult};
use crate::rules::{
    compile_command_rules, CommandRule, CRITICAL_PATHS, GENERIC_COMMIT_MESSAGES,
    VCS_METADATA_DIRS,
};

/// Static configuration for the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Project roots agents may touch. File operations must resolve inside
    /// at least one of them.
    #[serde(default)]
    pub allowed_roots: Vec<PathBuf>,

    /// Commands longer than this are denied outright.
    #[serde(default = "default_max_command_length")]
    pub max_command_length: usize,

    /// Commit messages shorter than this are denied.
    #[serde(default = "default_min_commit_message_len")]
    pub min_commit_message_len: usize,

    /// Branches that may not be force-pushed, hard-reset to, or deleted.
    #[serde(default = "default_protected_branches")]
    pub protected_branches: Vec<String>,

    /// Paths inside the roots that agents may read but never write or
    /// delete, such as the audit log and backup store.
    #[serde(default)]
    pub protected_paths: Vec<PathBuf>,
}

impl ValidatorConfig {
    /// Config with the given roots and default limits.
    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            allowed_roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add read-only paths on top of the configured ones.
    pub fn with_protected_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.protected_paths
            .extend(paths.into_iter().map(Into::into));
        self
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_roots: Vec::new(),
            max_command_length: default_max_command_length(),
            min_commit_message_len: default_min_commit_message_len(),
            protected_branches: default_protected_branches(),
            protected_paths: Vec::new(),
        }
    }
}

fn default_max_command_length() -> usize {
    10_000
}

fn default_min_commit_message_len() -> usize {
    10
}

fn default_protected_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

/// A step in the evaluation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationStep {
    /// Which check was performed (e.g., "denylist", "root_containment").
    pub check: String,
    /// What happened (e.g., "passed", "failed: recursive_delete").
    pub outcome: String,
    /// Whether this step decided the result.
    pub terminal: bool,
}

/// Full evaluation trace returned alongside a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub decision: ValidationResult,
    pub steps: Vec<EvaluationStep>,
}

/// Collects steps while the checks run.
#[derive(Default)]
struct Steps(Vec<EvaluationStep>);

impl Steps {
    fn pass(&mut self, check: &str) {
        self.0.push(EvaluationStep {
            check: check.to_string(),
            outcome: "passed".to_string(),
            terminal: false,
        });
    }

    fn deny(&mut self, check: &str, reason: String, severity: Severity) -> ValidationResult {
        self.0.push(EvaluationStep {
            check: check.to_string(),
            outcome: format!("failed: {}", reason),
            terminal: true,
        });
        ValidationResult::deny(reason, severity)
    }

    fn allow(&mut self, reason: &str) -> ValidationResult {
        self.0.push(EvaluationStep {
            check: "default_allow".to_string(),
            outcome: reason.to_string(),
            terminal: true,
        });
        ValidationResult::allow(reason)
    }
}

/// The policy validator.
pub struct Validator {
    config: ValidatorConfig,
    roots: Vec<PathBuf>,
    protected: Vec<PathBuf>,
    command_rules: Vec<CommandRule>,
}

impl Validator {
    /// Build a validator. Fails if no project roots are configured.
    pub fn new(config: ValidatorConfig) -> Result<Self, PolicyError> {
        if config.allowed_roots.is_empty() {
            return Err(PolicyError::NoAllowedRoots);
        }

        let roots = config
            .allowed_roots
            .iter()
            .map(|root| resolve_root(root))
            .collect::<Result<Vec<_>, _>>()?;
        let protected = config
            .protected_paths
            .iter()
            .map(|path| resolve_root(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            roots,
            protected,
            command_rules: compile_command_rules()?,
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The allowed roots in canonical form.
    pub fn allowed_roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Validate a shell command. When `kind` is `GitOperation`, or the
    /// command starts with `git `, the git rules run as well.
    pub fn validate_command(&self, command: &str, kind: OperationKind) -> ValidationResult {
        self.check_command(command, kind, &mut Steps::default())
    }

    /// Validate a file access of the given kind.
    pub fn validate_file_path(&self, path: &str, kind: OperationKind) -> ValidationResult {
        self.check_file(path, kind, &mut Steps::default())
    }

    /// Validate a git invocation.
    pub fn validate_git_operation(&self, git_command: &str) -> ValidationResult {
        self.check_git(git_command, &mut Steps::default())
    }

    /// Validate any operation, dispatching on its kind.
    pub fn validate_operation(&self, operation: &Operation) -> ValidationResult {
        let result = self.validate_with_trace(operation).decision;
        if !result.allowed {
            tracing::debug!(
                kind = %operation.kind(),
                reason = %result.reason,
                "operation denied by policy"
            );
        }
        result
    }

    /// Validate an operation and return every check that ran.
    pub fn validate_with_trace(&self, operation: &Operation) -> EvaluationTrace {
        let mut steps = Steps::default();
        let decision = match operation {
            Operation::Command { command } => {
                self.check_command(command, OperationKind::Command, &mut steps)
            }
            Operation::Git { command } => self.check_git(command, &mut steps),
            Operation::FileRead { path }
            | Operation::FileWrite { path }
            | Operation::FileDelete { path } => self.check_file(path, operation.kind(), &mut steps),
        };
        EvaluationTrace {
            decision,
            steps: steps.0,
        }
    }

    // ── Commands ────────────────────────────────────────────────

    fn check_command(&self, command: &str, kind: OperationKind, steps: &mut Steps) -> ValidationResult {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return steps.deny("empty", "empty command".to_string(), Severity::Warning);
        }
        steps.pass("empty");

        if command.chars().count() > self.config.max_command_length {
            return steps.deny(
                "length",
                format!(
                    "command exceeds maximum length of {} characters",
                    self.config.max_command_length
                ),
                Severity::Error,
            );
        }
        steps.pass("length");

        if let Some(denied) = self.check_denylist(command, steps) {
            return denied;
        }

        if kind == OperationKind::GitOperation || trimmed.starts_with("git ") {
            return self.check_git_rules(trimmed, steps);
        }

        steps.allow("no deny rule matched")
    }

    fn check_denylist(&self, command: &str, steps: &mut Steps) -> Option<ValidationResult> {
        match self
            .command_rules
            .iter()
            .find(|rule| rule.regex.is_match(command))
        {
            Some(rule) => Some(steps.deny(
                "denylist",
                format!("{} ({})", rule.description, rule.name),
                Severity::Error,
            )),
            None => {
                steps.pass("denylist");
                None
            }
        }
    }

    // ── Files ───────────────────────────────────────────────────

    fn check_file(&self, raw: &str, kind: OperationKind, steps: &mut Steps) -> ValidationResult {
        if raw.trim().is_empty() {
            return steps.deny("empty", "empty file path".to_string(), Severity::Warning);
        }
        steps.pass("empty");

        // Relative paths are interpreted against the first project root.
        let resolved = resolve_path(raw, &self.roots[0]);

        if let Some(critical) = CRITICAL_PATHS
            .iter()
            .find(|critical| resolved.starts_with(Path::new(critical)))
        {
            return steps.deny(
                "critical_path",
                format!(
                    "access to critical system path '{}' is not allowed ({})",
                    resolved.display(),
                    critical
                ),
                Severity::Error,
            );
        }
        steps.pass("critical_path");

        let Some(root) = self.roots.iter().find(|root| resolved.starts_with(root)) else {
            return steps.deny(
                "root_containment",
                format!(
                    "path '{}' resolves outside the allowed project roots",
                    resolved.display()
                ),
                Severity::Error,
            );
        };
        steps.pass("root_containment");

        if kind == OperationKind::FileDelete && resolved == *root {
            return steps.deny(
                "root_deletion",
                format!("refusing to delete project root '{}'", root.display()),
                Severity::Error,
            );
        }
        steps.pass("root_deletion");

        if matches!(kind, OperationKind::FileWrite | OperationKind::FileDelete) {
            let inside_vcs = resolved
                .strip_prefix(root)
                .map(|rel| {
                    rel.components().any(|c| {
                        VCS_METADATA_DIRS
                            .iter()
                            .any(|dir| c.as_os_str() == std::ffi::OsStr::new(dir))
                    })
                })
                .unwrap_or(false);
            if inside_vcs {
                return steps.deny(
                    "vcs_metadata",
                    format!(
                        "modifying version-control metadata at '{}' is not allowed",
                        resolved.display()
                    ),
                    Severity::Error,
                );
            }
        }
        steps.pass("vcs_metadata");

        if matches!(kind, OperationKind::FileWrite | OperationKind::FileDelete) {
            if let Some(protected) = self.protected.iter().find(|p| resolved.starts_with(p)) {
                return steps.deny(
                    "protected_path",
                    format!(
                        "'{}' is read-only Warden state ({})",
                        resolved.display(),
                        protected.display()
                    ),
                    Severity::Error,
                );
            }
        }
        steps.pass("protected_path");

        steps.allow("path is inside an allowed project root")
    }

    // ── Git ─────────────────────────────────────────────────────

    fn check_git(&self, command: &str, steps: &mut Steps) -> ValidationResult {
        if command.trim().is_empty() {
            return steps.deny("empty", "empty git command".to_string(), Severity::Warning);
        }
        steps.pass("empty");

        if let Some(denied) = self.check_denylist(command, steps) {
            return denied;
        }
        self.check_git_rules(command, steps)
    }

    fn check_git_rules(&self, command: &str, steps: &mut Steps) -> ValidationResult {
        let Some(git) = GitInvocation::parse(command) else {
            return steps.deny(
                "git_parse",
                "git command has no subcommand".to_string(),
                Severity::Warning,
            );
        };
        steps.pass("git_parse");

        match git.subcommand.as_str() {
            "push" => {
                if let Some(denied) = self.check_push(&git, steps) {
                    return denied;
                }
            }
            "reset" => {
                if let Some(denied) = self.check_reset(&git, steps) {
                    return denied;
                }
            }
            "clean" => {
                if git.has_flag("force", Some('f'))
                    && (git.has_flag("", Some('d')) || git.has_flag("", Some('x')))
                {
                    return steps.deny(
                        "git_clean",
                        "git clean -f with -d/-x deletes untracked work".to_string(),
                        Severity::Error,
                    );
                }
                steps.pass("git_clean");
            }
            "branch" => {
                let deleting = git.has_flag("delete", Some('d')) || git.has_flag("", Some('D'));
                if deleting {
                    if let Some(branch) = git
                        .positionals()
                        .into_iter()
                        .find(|b| self.is_protected(b))
                    {
                        return steps.deny(
                            "git_branch_delete",
                            format!("deleting protected branch '{}' is not allowed", branch),
                            Severity::Error,
                        );
                    }
                }
                steps.pass("git_branch_delete");
            }
            "commit" => {
                if let Some(message) = git.commit_message() {
                    if let Some(denied) = self.check_commit_message(&message, steps) {
                        return denied;
                    }
                }
            }
            _ => {}
        }

        steps.allow("no git rule matched")
    }

    fn check_push(&self, git: &GitInvocation, steps: &mut Steps) -> Option<ValidationResult> {
        let positionals = git.positionals();
        // First positional is the remote; the rest are refspecs.
        let refspecs: Vec<&str> = positionals.iter().skip(1).copied().collect();

        let force_flag = git.has_flag("force", Some('f'))
            || git.has_flag("force-with-lease", None)
            || git.has_flag("force-if-includes", None);
        let plus_refspec = refspecs.iter().any(|r| r.starts_with('+'));

        if force_flag || plus_refspec {
            if refspecs.is_empty() {
                return Some(steps.deny(
                    "git_force_push",
                    "force push without an explicit branch is not allowed".to_string(),
                    Severity::Error,
                ));
            }
            for refspec in &refspecs {
                let forced = force_flag || refspec.starts_with('+');
                let branch = refspec_destination(refspec);
                if forced && (self.is_protected(branch) || branch == "HEAD") {
                    return Some(steps.deny(
                        "git_force_push",
                        format!("force push to protected branch '{}' is not allowed", branch),
                        Severity::Error,
                    ));
                }
            }
        }
        steps.pass("git_force_push");

        // `git push origin :main` or `git push --delete origin main`.
        let deleting = git.has_flag("delete", Some('d'));
        for refspec in &refspecs {
            let target = if let Some(stripped) = refspec.strip_prefix(':') {
                Some(stripped)
            } else if deleting {
                Some(refspec_destination(refspec))
            } else {
                None
            };
            if let Some(branch) = target.filter(|b| self.is_protected(b)) {
                return Some(steps.deny(
                    "git_remote_delete",
                    format!("deleting protected remote branch '{}' is not allowed", branch),
                    Severity::Error,
                ));
            }
        }
        steps.pass("git_remote_delete");
        None
    }

    fn check_reset(&self, git: &GitInvocation, steps: &mut Steps) -> Option<ValidationResult> {
        if git.has_flag("hard", None) {
            for target in git.positionals() {
                if let Some((_remote, branch)) = target.rsplit_once('/') {
                    if self.is_protected(branch) {
                        return Some(steps.deny(
                            "git_hard_reset",
                            format!(
                                "hard reset to remote default branch '{}' is not allowed",
                                target
                            ),
                            Severity::Error,
                        ));
                    }
                }
            }
        }
        steps.pass("git_hard_reset");
        None
    }

    fn check_commit_message(&self, message: &str, steps: &mut Steps) -> Option<ValidationResult> {
        let normalized = message.trim().to_lowercase();

        if GENERIC_COMMIT_MESSAGES.contains(&normalized.as_str()) {
            return Some(steps.deny(
                "commit_message",
                format!("commit message '{}' is too generic", message.trim()),
                Severity::Warning,
            ));
        }

        if normalized.chars().count() < self.config.min_commit_message_len {
            return Some(steps.deny(
                "commit_message",
                format!(
                    "commit message is shorter than {} characters",
                    self.config.min_commit_message_len
                ),
                Severity::Error,
            ));
        }

        steps.pass("commit_message");
        None
    }

    fn is_protected(&self, branch: &str) -> bool {
        let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
        self.config.protected_branches.iter().any(|p| p == branch)
    }
}

/// The destination branch of a push refspec: `+src:dst` → `dst`, `main` → `main`.
fn refspec_destination(refspec: &str) -> &str {
    let refspec = refspec.trim_start_matches('+');
    let dst = refspec.rsplit_once(':').map(|(_, dst)| dst).unwrap_or(refspec);
    dst.strip_prefix("refs/heads/").unwrap_or(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn validator_for(root: &str) -> Validator {
        Validator::new(ValidatorConfig::with_roots([root])).unwrap()
    }

    fn assert_denied(result: &ValidationResult) {
        assert!(!result.allowed, "expected denial, got {:?}", result);
    }

    fn assert_allowed(result: &ValidationResult) {
        assert!(result.allowed, "expected allow, got {:?}", result);
    }

    #[test]
    fn no_roots_is_a_configuration_error() {
        assert!(matches!(
            Validator::new(ValidatorConfig::default()),
            Err(PolicyError::NoAllowedRoots)
        ));
    }

    #[test]
    fn denylist_commands() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_command("rm -rf /tmp/x", OperationKind::Command));
        assert_allowed(&v.validate_command("ls -la", OperationKind::Command));
    }

    #[test]
    fn validation_is_pure() {
        let v = validator_for("/work/proj");
        for command in ["rm -rf /tmp/x", "ls -la", "git push --force origin main"] {
            let first = v.validate_command(command, OperationKind::Command);
            let second = v.validate_command(command, OperationKind::Command);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn overlong_and_empty_commands_are_denied() {
        let v = validator_for("/work/proj");
        let long = "a".repeat(10_001);
        let result = v.validate_command(&long, OperationKind::Command);
        assert_denied(&result);
        assert_eq!(result.severity, Severity::Error);

        let result = v.validate_command("   ", OperationKind::Command);
        assert_denied(&result);
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn path_containment() {
        let v = validator_for("/work/proj");
        assert_allowed(&v.validate_file_path("/work/proj/src/a.py", OperationKind::FileRead));
        assert_denied(&v.validate_file_path("/etc/passwd", OperationKind::FileRead));
        assert_denied(&v.validate_file_path(
            "/work/proj/../../etc/passwd",
            OperationKind::FileRead,
        ));
        assert_denied(&v.validate_file_path("/work/other/a.py", OperationKind::FileRead));
    }

    #[test]
    fn traversal_that_stays_inside_is_allowed() {
        // Canonicalization is the source of truth, not the literal "..".
        let v = validator_for("/work/proj");
        assert_allowed(&v.validate_file_path(
            "/work/proj/src/../tests/a.py",
            OperationKind::FileRead,
        ));
    }

    #[test]
    fn sibling_prefix_is_not_contained() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_file_path(
            "/work/project-evil/a.py",
            OperationKind::FileRead,
        ));
    }

    #[test]
    fn relative_paths_resolve_against_first_root() {
        let dir = tempdir().unwrap();
        let v = validator_for(dir.path().to_str().unwrap());
        assert_allowed(&v.validate_file_path("src/lib.rs", OperationKind::FileWrite));
        assert_denied(&v.validate_file_path("../../outside.txt", OperationKind::FileWrite));
    }

    #[test]
    fn deleting_the_root_is_denied() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_file_path("/work/proj", OperationKind::FileDelete));
        assert_allowed(&v.validate_file_path("/work/proj/old.txt", OperationKind::FileDelete));
    }

    #[test]
    fn vcs_metadata_is_read_only() {
        let v = validator_for("/work/proj");
        assert_allowed(&v.validate_file_path("/work/proj/.git/HEAD", OperationKind::FileRead));
        assert_denied(&v.validate_file_path("/work/proj/.git/HEAD", OperationKind::FileWrite));
    }

    #[test]
    fn protected_paths_are_read_only() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let config = ValidatorConfig::with_roots([&root])
            .with_protected_paths([root.join(".warden/audit.jsonl"), root.join(".warden/backups")]);
        let v = Validator::new(config).unwrap();

        let log = root.join(".warden/audit.jsonl");
        let log = log.to_str().unwrap();
        assert_allowed(&v.validate_file_path(log, OperationKind::FileRead));
        assert_denied(&v.validate_file_path(log, OperationKind::FileWrite));
        assert_denied(&v.validate_file_path(log, OperationKind::FileDelete));
        assert_denied(&v.validate_file_path(
            ".warden/backups/b1/manifest.json",
            OperationKind::FileDelete,
        ));
        // A sibling with a shared name prefix is not protected.
        assert_allowed(&v.validate_file_path(
            ".warden/audit.jsonl.bak",
            OperationKind::FileWrite,
        ));
    }

    #[cfg(unix)]
    #[test]
    fn parent_after_symlink_cannot_escape_the_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let outside = tempdir().unwrap();
        let outside_path = outside.path().canonicalize().unwrap();
        std::fs::create_dir_all(outside_path.join("a/b")).unwrap();
        std::fs::write(outside_path.join("a/secret.txt"), "x").unwrap();
        std::os::unix::fs::symlink(outside_path.join("a/b"), root.join("link")).unwrap();

        let v = validator_for(root.to_str().unwrap());
        assert_denied(&v.validate_file_path("link/../secret.txt", OperationKind::FileRead));
        assert_denied(&v.validate_file_path("link/../new.txt", OperationKind::FileWrite));
    }

    #[test]
    fn git_force_push_rules() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_git_operation("git push --force origin main"));
        assert_denied(&v.validate_git_operation("git push origin +master"));
        assert_denied(&v.validate_git_operation("git push -f"));
        assert_allowed(&v.validate_git_operation("git push origin feature-x"));
        assert_allowed(&v.validate_git_operation("git push --force origin feature-x"));
    }

    #[test]
    fn git_destructive_rules() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_git_operation("git reset --hard origin/main"));
        assert_allowed(&v.validate_git_operation("git reset --hard HEAD~1"));
        assert_denied(&v.validate_git_operation("git clean -fdx"));
        assert_allowed(&v.validate_git_operation("git clean -n"));
        assert_denied(&v.validate_git_operation("git branch -D main"));
        assert_denied(&v.validate_git_operation("git push origin :main"));
    }

    #[test]
    fn commit_message_rules() {
        let v = validator_for("/work/proj");

        let generic = v.validate_git_operation("git commit -m 'minor changes'");
        assert_denied(&generic);
        assert_eq!(generic.severity, Severity::Warning);

        let short = v.validate_git_operation("git commit -m 'tiny'");
        assert_denied(&short);
        assert_eq!(short.severity, Severity::Error);

        assert_allowed(&v.validate_git_operation(
            "git commit -m 'Handle empty config files in loader'",
        ));
        assert_allowed(&v.validate_git_operation("git commit --amend --no-edit"));
    }

    #[test]
    fn git_commands_also_hit_the_denylist() {
        let v = validator_for("/work/proj");
        let result = v.validate_git_operation("git status; rm -rf /");
        assert_denied(&result);
        assert!(result.reason.contains("recursive_delete"));
    }

    #[test]
    fn command_kind_git_runs_git_rules() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_command("git push --force origin main", OperationKind::Command));
    }

    #[test]
    fn dispatch_by_operation_variant() {
        let v = validator_for("/work/proj");
        assert_denied(&v.validate_operation(&Operation::command("mkfs.ext4 /dev/sdb")));
        assert_denied(&v.validate_operation(&Operation::file_read("/etc/shadow")));
        assert_denied(&v.validate_operation(&Operation::git("git push -f origin main")));
        assert_allowed(&v.validate_operation(&Operation::file_write("/work/proj/README.md")));
    }

    #[test]
    fn trace_marks_terminal_step() {
        let v = validator_for("/work/proj");
        let trace = v.validate_with_trace(&Operation::file_read("/etc/passwd"));
        assert!(!trace.decision.allowed);
        let last = trace.steps.last().unwrap();
        assert!(last.terminal);
        assert_eq!(last.check, "critical_path");
        assert!(trace.steps[..trace.steps.len() - 1].iter().all(|s| !s.terminal));

        let trace = v.validate_with_trace(&Operation::command("ls"));
        assert!(trace.decision.allowed);
        assert_eq!(trace.steps.last().unwrap().check, "default_allow");
    }
}
