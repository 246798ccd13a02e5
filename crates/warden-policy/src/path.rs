// path.rs — Canonical path resolution for containment checks.
//
// Containment is decided on a canonical absolute path, never on the literal
// text the agent supplied. The longest existing prefix of the raw path is
// handed to the OS, so a `..` after a symlink climbs out of the link's
// target, not out of the directory holding the link. Only the tail that
// does not exist yet is folded lexically.

use std::path::{Component, Path, PathBuf};

use crate::error::PolicyError;

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, so `/a/../../etc` becomes `/etc`.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Resolve a possibly-relative path against `base` into canonical form.
pub fn resolve_path(raw: impl AsRef<Path>, base: &Path) -> PathBuf {
    let raw = raw.as_ref();
    let joined = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        base.join(raw)
    };
    canonicalize_existing_prefix(&joined)
}

/// Resolve a configured project root. Relative roots are taken relative to
/// the current working directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf, PolicyError> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| PolicyError::InvalidRoot {
            root: root.display().to_string(),
            reason: e.to_string(),
        })?;
        cwd.join(root)
    };
    Ok(canonicalize_existing_prefix(&absolute))
}

/// Canonicalize the longest existing prefix of `path` (symlinks and `..`
/// resolved by the OS) and apply the remaining components on top of it.
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = path.components().collect();

    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        let Ok(canonical) = prefix.canonicalize() else {
            continue;
        };

        let tail = &components[split..];
        let has_parent = tail.iter().any(|c| matches!(c, Component::ParentDir));
        let mut resolved = canonical;
        for component in tail {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => resolved.push(name),
                _ => {}
            }
        }

        // A `..` in the missing tail can step back into existing
        // directories. The folded path has no `..` left, so one more pass
        // resolves any symlink it now reaches.
        return if has_parent {
            canonicalize_existing_prefix(&resolved)
        } else {
            resolved
        };
    }

    // Nothing on this path exists (not even the root).
    normalize_lexically(path)
}
