// config.rs — Sandbox settings, loaded from the `[sandbox]` section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::limits::ResourceLimits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Directory under which sandbox directories are allocated.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// CPU-time ceiling for sandboxed children, in seconds.
    #[serde(default = "default_cpu_seconds")]
    pub cpu_seconds: u64,

    /// Address-space ceiling for sandboxed children, in MiB.
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u64,

    /// Whether callers that don't say otherwise get a project snapshot.
    #[serde(default = "default_copy_project")]
    pub copy_project: bool,
}

fn default_root() -> PathBuf {
    std::env::temp_dir().join("warden-sandboxes")
}

fn default_cpu_seconds() -> u64 {
    300
}

fn default_memory_mb() -> u64 {
    2048
}

fn default_copy_project() -> bool {
    true
}

impl SandboxConfig {
    /// Standard settings with sandboxes allocated under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits::new(self.cpu_seconds, self.memory_mb)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            cpu_seconds: default_cpu_seconds(),
            memory_mb: default_memory_mb(),
            copy_project: default_copy_project(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: SandboxConfig = serde_json::from_str(r#"{"cpu_seconds": 10}"#).unwrap();
        assert_eq!(config.cpu_seconds, 10);
        assert_eq!(config.memory_mb, 2048);
        assert!(config.copy_project);
        assert!(config.root.ends_with("warden-sandboxes"));
    }

    #[test]
    fn limits_reflect_config() {
        let config = SandboxConfig {
            cpu_seconds: 5,
            memory_mb: 64,
            ..SandboxConfig::default()
        };
        assert_eq!(config.limits(), ResourceLimits::new(5, 64));
    }
}
