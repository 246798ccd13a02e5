//! # warden-workspace
//!
//! Project-tree plumbing shared by the sandbox and recovery managers:
//! filtered recursive copies, sorted walks, and content digests that ignore
//! VCS metadata and build noise.

pub mod error;
pub mod exclude;
pub mod tree;

pub use error::WorkspaceError;
pub use exclude::{ExcludePatterns, IGNORE_FILE};
pub use tree::{clear_dir, copy_tree, is_empty_dir, tree_digest, walk_files, TreeDigest, TreeStats};
