// exclude.rs — Which entries to leave out when copying a project tree.
//
// Sandboxes and backups want the agent's work product, not version-control
// metadata, caches, build output, or installed dependencies. Patterns are
// matched against single path components:
// - `dirname/`: an entry with this exact name, at any depth
// - a glob with `*`, `?` or `[` (e.g. `*.pyc`), matched via `glob::Pattern`
// - `name`: exact name match

use std::fs;
use std::path::{Component, Path};

/// Name of the per-project override file. One pattern per line, `#`
/// comments and blank lines ignored.
pub const IGNORE_FILE: &str = ".wardenignore";

/// Default patterns for VCS metadata and common build/cache noise.
const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git/",
    ".hg/",
    ".svn/",
    // Python
    "__pycache__/",
    "*.pyc",
    ".pytest_cache/",
    ".mypy_cache/",
    ".venv/",
    "venv/",
    // Node
    "node_modules/",
    // Rust
    "target/",
    // General build
    "dist/",
    "build/",
    ".cache/",
    ".DS_Store",
];

#[derive(Debug, Clone)]
enum Matcher {
    Dir(String),
    Glob(glob::Pattern),
    Exact(String),
}

impl Matcher {
    fn parse(pattern: &str) -> Self {
        if let Some(dir) = pattern.strip_suffix('/') {
            return Matcher::Dir(dir.to_string());
        }
        if pattern.chars().any(|c| matches!(c, '*' | '?' | '[')) {
            if let Ok(glob) = glob::Pattern::new(pattern) {
                return Matcher::Glob(glob);
            }
            tracing::warn!(pattern, "invalid exclude glob, matching literally");
        }
        Matcher::Exact(pattern.to_string())
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Dir(dir) => name == dir,
            Matcher::Glob(glob) => glob.matches(name),
            Matcher::Exact(exact) => name == exact,
        }
    }
}

/// Exclude patterns for tree copies.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    matchers: Vec<Matcher>,
}

impl ExcludePatterns {
    /// Governor state directories, always excluded regardless of patterns.
    /// Backups live under `.warden/`, so copying it would recurse.
    const INFRA_DIRS: &'static [&'static str] = &[".warden"];

    /// Load patterns from `.wardenignore` in `project_dir`, or use defaults.
    pub fn load(project_dir: &Path) -> Self {
        let ignore_path = project_dir.join(IGNORE_FILE);
        if ignore_path.exists() {
            if let Ok(content) = fs::read_to_string(&ignore_path) {
                return Self::from_ignore_file(&content);
            }
        }
        Self::defaults()
    }

    /// Parse `.wardenignore` content.
    pub fn from_ignore_file(content: &str) -> Self {
        Self::from_patterns(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            matchers: patterns
                .into_iter()
                .map(|p| Matcher::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn defaults() -> Self {
        Self::from_patterns(DEFAULT_EXCLUDES)
    }

    /// Only the always-excluded governor directories.
    pub fn none() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Check a single path component (file or directory name).
    pub fn should_exclude(&self, name: &str) -> bool {
        Self::INFRA_DIRS.contains(&name) || self.matchers.iter().any(|m| m.matches(name))
    }

    /// Check every component of a relative path.
    pub fn should_skip_path(&self, rel_path: &Path) -> bool {
        rel_path.components().any(|component| match component {
            Component::Normal(name) => self.should_exclude(&name.to_string_lossy()),
            _ => false,
        })
    }
}

impl Default for ExcludePatterns {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_skip_vcs_and_build_noise() {
        let excludes = ExcludePatterns::defaults();
        for name in [".git", "node_modules", "__pycache__", "target", "mod.pyc", ".warden"] {
            assert!(excludes.should_exclude(name), "{} should be excluded", name);
        }
        for name in ["src", "main.py", "Cargo.toml", ".gitignore"] {
            assert!(!excludes.should_exclude(name), "{} should be kept", name);
        }
    }

    #[test]
    fn none_still_excludes_governor_state() {
        let excludes = ExcludePatterns::none();
        assert!(excludes.should_exclude(".warden"));
        assert!(!excludes.should_exclude(".git"));
    }

    #[test]
    fn ignore_file_parsing() {
        let excludes = ExcludePatterns::from_ignore_file(
            "# comment\n\nlogs/\n*.log\nsecret.env\ndata-[0-9].bin\n",
        );
        assert!(excludes.should_exclude("logs"));
        assert!(excludes.should_exclude("debug.log"));
        assert!(excludes.should_exclude("secret.env"));
        assert!(excludes.should_exclude("data-3.bin"));
        assert!(!excludes.should_exclude("data-x.bin"));
        assert!(!excludes.should_exclude("# comment"));
        assert!(!excludes.should_exclude("node_modules"));
    }

    #[test]
    fn skip_path_checks_every_component() {
        let excludes = ExcludePatterns::defaults();
        assert!(excludes.should_skip_path(Path::new("src/__pycache__/mod.cpython.pyc")));
        assert!(excludes.should_skip_path(Path::new(".git/HEAD")));
        assert!(!excludes.should_skip_path(Path::new("src/app/main.py")));
    }

    #[test]
    fn load_prefers_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ExcludePatterns::load(dir.path()).should_exclude(".git"));

        fs::write(dir.path().join(IGNORE_FILE), "fixtures/\n").unwrap();
        let excludes = ExcludePatterns::load(dir.path());
        assert!(excludes.should_exclude("fixtures"));
        assert!(!excludes.should_exclude(".git"));
    }
}
