// config.rs — WardenConfig: one TOML file configuring every collaborator.
//
// Layout under a project (see `WardenConfig::for_project`):
//
//   <project>/.warden/warden.toml    this file
//   <project>/.warden/audit.jsonl    audit log
//   <project>/.warden/backups/       backup store
//   <project>/.warden/sandboxes/     sandbox root
//
// Relative paths in the file resolve against the project root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use warden_monitor::MonitorConfig;
use warden_policy::ValidatorConfig;
use warden_recovery::RecoveryConfig;
use warden_sandbox::SandboxConfig;

use crate::error::WardenError;

/// Directory under the project root holding Warden state.
pub const WARDEN_DIR: &str = ".warden";
/// Config file name inside [`WARDEN_DIR`].
pub const CONFIG_FILE: &str = "warden.toml";
/// Environment variable consulted when the config has no `master_key`.
pub const MASTER_KEY_ENV: &str = "WARDEN_MASTER_KEY";
/// Minimum audit chain key length in bytes.
pub const MIN_MASTER_KEY_LEN: usize = 16;

/// `[policy]`: validator settings plus how soft denials are treated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySection {
    #[serde(flatten)]
    pub validator: ValidatorConfig,

    /// When false, Warning-severity denials (generic commit messages) are
    /// let through with the warning kept as the reason.
    #[serde(default = "default_true")]
    pub enforce_soft_denials: bool,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            enforce_soft_denials: true,
        }
    }
}

/// `[audit]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Mirror each entry to the tracing output.
    #[serde(default = "default_true")]
    pub console_mirror: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            console_mirror: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> PathBuf {
    PathBuf::from(WARDEN_DIR).join("audit.jsonl")
}

/// Complete Warden configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Key for the audit hash chain. Falls back to `WARDEN_MASTER_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key: Option<String>,

    #[serde(default)]
    pub policy: PolicySection,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub audit: AuditSection,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl std::fmt::Debug for WardenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenConfig")
            .field("policy", &self.policy)
            .field("monitor", &self.monitor)
            .field("audit", &self.audit)
            .field("sandbox", &self.sandbox)
            .field("recovery", &self.recovery)
            .field("master_key", &self.master_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WardenConfig {
    /// Defaults with the standard `.warden/` layout under `root`, which is
    /// also the sole allowed project root.
    pub fn for_project(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let dir = root.join(WARDEN_DIR);
        Self {
            policy: PolicySection {
                validator: ValidatorConfig::with_roots([root]),
                enforce_soft_denials: true,
            },
            audit: AuditSection {
                log_path: dir.join("audit.jsonl"),
                ..AuditSection::default()
            },
            sandbox: SandboxConfig::with_root(dir.join("sandboxes")),
            recovery: RecoveryConfig::with_root(dir.join("backups")),
            ..Self::default()
        }
    }

    /// Where the config for `root` lives by default.
    pub fn default_path(root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(WARDEN_DIR).join(CONFIG_FILE)
    }

    /// Parse a config file as-is (no path resolution).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| WardenError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, WardenError> {
        toml::from_str(content).map_err(|source| WardenError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config for a project.
    ///
    /// An explicit `config_path` must exist. Without one, the default
    /// location is used if present, otherwise [`WardenConfig::for_project`]
    /// defaults. Either way, relative paths are anchored at `root` and an
    /// empty root list falls back to `root`.
    pub fn load_for_project(
        root: impl AsRef<Path>,
        config_path: Option<&Path>,
    ) -> Result<Self, WardenError> {
        let root = root.as_ref();
        let config = match config_path {
            Some(path) => Self::load(path)?,
            None => {
                let path = Self::default_path(root);
                if path.is_file() {
                    Self::load(&path)?
                } else {
                    tracing::debug!(root = %root.display(), "no config file; using defaults");
                    return Ok(Self::for_project(root));
                }
            }
        };
        Ok(config.anchored_at(root))
    }

    /// Resolve relative paths against `root` and fill in empty roots.
    pub fn anchored_at(mut self, root: &Path) -> Self {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        if self.policy.validator.allowed_roots.is_empty() {
            self.policy.validator.allowed_roots.push(root.to_path_buf());
        }
        self.policy.validator.allowed_roots.iter_mut().for_each(anchor);
        anchor(&mut self.audit.log_path);
        anchor(&mut self.sandbox.root);
        anchor(&mut self.recovery.backup_root);
        self
    }

    /// The audit chain key, from the config or the environment.
    pub fn master_key(&self) -> Result<Vec<u8>, WardenError> {
        select_master_key(self.master_key.as_deref(), std::env::var(MASTER_KEY_ENV).ok())
    }
}

fn select_master_key(configured: Option<&str>, env: Option<String>) -> Result<Vec<u8>, WardenError> {
    let key = configured
        .map(str::to_string)
        .or(env)
        .filter(|k| !k.is_empty())
        .ok_or(WardenError::MissingMasterKey {
            env: MASTER_KEY_ENV,
        })?;
    if key.len() < MIN_MASTER_KEY_LEN {
        return Err(WardenError::ShortMasterKey {
            len: key.len(),
            min: MIN_MASTER_KEY_LEN,
        });
    }
    Ok(key.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_project_uses_warden_dir() {
        let config = WardenConfig::for_project("/work/proj");
        assert_eq!(
            config.policy.validator.allowed_roots,
            vec![PathBuf::from("/work/proj")]
        );
        assert_eq!(
            config.audit.log_path,
            PathBuf::from("/work/proj/.warden/audit.jsonl")
        );
        assert_eq!(
            config.recovery.backup_root,
            PathBuf::from("/work/proj/.warden/backups")
        );
        assert_eq!(
            config.sandbox.root,
            PathBuf::from("/work/proj/.warden/sandboxes")
        );
        assert!(config.policy.enforce_soft_denials);
    }

    #[test]
    fn parses_sections_with_defaults() {
        let toml = r#"
master_key = "0123456789abcdef0123"

[policy]
allowed_roots = ["/work/proj"]
min_commit_message_len = 12
enforce_soft_denials = false

[monitor]
rapid_failure_threshold = 3

[audit]
console_mirror = false

[recovery]
keep_backups = 4
"#;
        let config = WardenConfig::parse(toml, Path::new("warden.toml")).unwrap();
        assert_eq!(config.policy.validator.min_commit_message_len, 12);
        assert_eq!(config.policy.validator.max_command_length, 10_000);
        assert!(!config.policy.enforce_soft_denials);
        assert_eq!(config.monitor.rapid_failure_threshold, 3);
        assert_eq!(config.monitor.history_capacity, 100);
        assert!(!config.audit.console_mirror);
        assert_eq!(config.recovery.keep_backups, 4);
        assert!(config.recovery.auto_backup);
        assert_eq!(config.master_key().unwrap().len(), 20);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = WardenConfig::parse("", Path::new("warden.toml")).unwrap();
        assert!(config.policy.validator.allowed_roots.is_empty());
        assert!(config.policy.enforce_soft_denials);
        assert!(config.master_key.is_none());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = WardenConfig::parse("[policy\n", Path::new("warden.toml")).unwrap_err();
        assert!(matches!(err, WardenError::ConfigParse { .. }));
    }

    #[test]
    fn relative_paths_anchor_at_project() {
        let config = WardenConfig::parse(
            "[recovery]\nbackup_root = \"snapshots\"\n",
            Path::new("warden.toml"),
        )
        .unwrap()
        .anchored_at(Path::new("/work/proj"));
        assert_eq!(
            config.recovery.backup_root,
            PathBuf::from("/work/proj/snapshots")
        );
        assert_eq!(
            config.audit.log_path,
            PathBuf::from("/work/proj/.warden/audit.jsonl")
        );
        assert_eq!(
            config.policy.validator.allowed_roots,
            vec![PathBuf::from("/work/proj")]
        );
    }

    #[test]
    fn load_for_project_without_file_uses_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = WardenConfig::load_for_project(dir.path(), None).unwrap();
        assert_eq!(
            config.audit.log_path,
            dir.path().join(".warden/audit.jsonl")
        );

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            WardenConfig::load_for_project(dir.path(), Some(&missing)),
            Err(WardenError::ConfigRead { .. })
        ));
    }

    #[test]
    fn master_key_sources_and_length() {
        assert!(matches!(
            select_master_key(None, None),
            Err(WardenError::MissingMasterKey { .. })
        ));
        assert!(matches!(
            select_master_key(Some(""), None),
            Err(WardenError::MissingMasterKey { .. })
        ));
        assert!(matches!(
            select_master_key(Some("short"), None),
            Err(WardenError::ShortMasterKey { len: 5, .. })
        ));
        let from_env = select_master_key(None, Some("e".repeat(16))).unwrap();
        assert_eq!(from_env, b"eeeeeeeeeeeeeeee".to_vec());
        let configured = select_master_key(Some(&"c".repeat(16)), Some("e".repeat(16))).unwrap();
        assert_eq!(configured[0], b'c');
    }

    #[test]
    fn debug_redacts_master_key() {
        let mut config = WardenConfig::for_project("/work/proj");
        config.master_key = Some("super-secret-key-material".into());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
