// tree.rs — Recursive copy, walk, and digest of project trees.
//
// Symlinks are never followed or copied: a link inside a project could point
// anywhere on the host, and materializing its target in a sandbox or backup
// would leak it.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::WorkspaceError;
use crate::exclude::ExcludePatterns;

/// File count and total size of a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub file_count: u64,
    pub size_bytes: u64,
}

/// Stats plus a SHA-256 digest over every file's relative path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDigest {
    pub file_count: u64,
    pub size_bytes: u64,
    /// Lowercase hex.
    pub digest: String,
}

/// Recursively copy `src` into `dst` (created if missing), skipping excluded
/// entries. Returns what was copied.
pub fn copy_tree(
    src: &Path,
    dst: &Path,
    excludes: &ExcludePatterns,
) -> Result<TreeStats, WorkspaceError> {
    if !src.is_dir() {
        return Err(WorkspaceError::NotADirectory {
            path: src.to_path_buf(),
        });
    }
    if let (Ok(src_abs), Ok(dst_abs)) = (src.canonicalize(), absolute_path(dst)) {
        if dst_abs.starts_with(&src_abs) && !is_excluded_within(&src_abs, &dst_abs, excludes)
        {
            return Err(WorkspaceError::NestedDestination {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
            });
        }
    }

    fs::create_dir_all(dst).map_err(|e| WorkspaceError::io(dst, e))?;
    let mut stats = TreeStats::default();
    copy_dir_recursive(src, dst, excludes, &mut stats)?;
    Ok(stats)
}

fn copy_dir_recursive(
    src: &Path,
    dst: &Path,
    excludes: &ExcludePatterns,
    stats: &mut TreeStats,
) -> Result<(), WorkspaceError> {
    let entries = fs::read_dir(src).map_err(|e| WorkspaceError::io(src, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::io(src, e))?;
        let file_name = entry.file_name();
        if excludes.should_exclude(&file_name.to_string_lossy()) {
            continue;
        }

        let src_path = entry.path();
        let dst_path = dst.join(&file_name);
        let file_type = entry
            .file_type()
            .map_err(|e| WorkspaceError::io(&src_path, e))?;

        if file_type.is_symlink() {
            tracing::debug!(path = %src_path.display(), "skipping symlink");
        } else if file_type.is_dir() {
            fs::create_dir_all(&dst_path).map_err(|e| WorkspaceError::io(&dst_path, e))?;
            copy_dir_recursive(&src_path, &dst_path, excludes, stats)?;
        } else {
            let bytes = fs::copy(&src_path, &dst_path).map_err(|e| WorkspaceError::io(&dst_path, e))?;
            stats.file_count += 1;
            stats.size_bytes += bytes;
        }
    }

    Ok(())
}

/// Collect every non-excluded regular file under `root`, as sorted relative
/// paths. A missing root yields an empty list.
pub fn walk_files(root: &Path, excludes: &ExcludePatterns) -> Result<Vec<PathBuf>, WorkspaceError> {
    let mut files = Vec::new();
    if root.is_dir() {
        walk_dir_relative(root, root, excludes, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn walk_dir_relative(
    dir: &Path,
    root: &Path,
    excludes: &ExcludePatterns,
    files: &mut Vec<PathBuf>,
) -> Result<(), WorkspaceError> {
    let entries = fs::read_dir(dir).map_err(|e| WorkspaceError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::io(dir, e))?;
        if excludes.should_exclude(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| WorkspaceError::io(&path, e))?;

        if file_type.is_dir() {
            walk_dir_relative(&path, root, excludes, files)?;
        } else if file_type.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                files.push(rel.to_path_buf());
            }
        }
    }

    Ok(())
}

/// Hash a tree: for each file in sorted order, its `/`-separated relative
/// path, a NUL, its length, and its bytes. Two trees with the same digest
/// have the same files with the same contents.
pub fn tree_digest(root: &Path, excludes: &ExcludePatterns) -> Result<TreeDigest, WorkspaceError> {
    let mut hasher = Sha256::new();
    let mut stats = TreeStats::default();
    let mut buf = vec![0u8; 64 * 1024];

    for rel in walk_files(root, excludes)? {
        let path = root.join(&rel);
        let len = fs::metadata(&path)
            .map_err(|e| WorkspaceError::io(&path, e))?
            .len();
        hasher.update(portable_path(&rel).as_bytes());
        hasher.update([0u8]);
        hasher.update(len.to_le_bytes());

        let mut file = fs::File::open(&path).map_err(|e| WorkspaceError::io(&path, e))?;
        loop {
            let n = file.read(&mut buf).map_err(|e| WorkspaceError::io(&path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        stats.file_count += 1;
        stats.size_bytes += len;
    }

    Ok(TreeDigest {
        file_count: stats.file_count,
        size_bytes: stats.size_bytes,
        digest: format!("{:x}", hasher.finalize()),
    })
}

/// Remove every top-level entry of `dir` that is not excluded, leaving
/// excluded entries (e.g. `.git/`) in place.
pub fn clear_dir(dir: &Path, excludes: &ExcludePatterns) -> Result<(), WorkspaceError> {
    let entries = fs::read_dir(dir).map_err(|e| WorkspaceError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::io(dir, e))?;
        if excludes.should_exclude(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| WorkspaceError::io(&path, e))?;
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| WorkspaceError::io(&path, e))?;
    }
    Ok(())
}

/// Whether `dir` is missing or has no entries.
pub fn is_empty_dir(dir: &Path) -> Result<bool, WorkspaceError> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(WorkspaceError::io(dir, e)),
    }
}

fn portable_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Absolute form of `path`: its nearest existing ancestor canonicalized,
/// re-joined with the rest. Used only for the nesting check.
fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let mut existing = path;
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }
    let base = if existing.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        existing.canonicalize()?
    };
    Ok(rest.into_iter().rev().fold(base, |acc, name| acc.join(name)))
}

/// A destination nested in the source is fine when the copy would skip it
/// anyway (e.g. backups under `.warden/backups`).
fn is_excluded_within(src: &Path, dst: &Path, excludes: &ExcludePatterns) -> bool {
    dst.strip_prefix(src)
        .map(|rel| !rel.as_os_str().is_empty() && excludes.should_skip_path(rel))
        .unwrap_or(false)
}
