//! Dataset hierarchy
//!
//! A dataset is a directory tracked by git (and usually git-annex). Datasets
//! nest: a dataset may contain further datasets at arbitrary depth below it.
//! This module keeps such a hierarchy as an arena tree and can discover it
//! from disk.

mod discovery;
mod tree;

pub use tree::{DatasetId, DatasetNode, DatasetTree};

use std::path::{Component, Path, PathBuf};

/// Name of the VCS metadata entry that marks a directory as a dataset
pub const VCS_DIR: &str = ".git";

/// Directory (inside a dataset) holding dsman's own per-dataset files
pub const DATASET_CONFIG_DIR: &str = ".dsman";

/// Check whether `path` carries a dataset
///
/// Both a `.git` directory and a `.git` gitlink file (as used by submodules)
/// count.
pub fn is_dataset(path: &Path) -> bool {
    path.join(VCS_DIR).exists()
}

/// Nearest dataset containing `start`, `start` itself included
pub fn find_dataset_root(start: &Path) -> Option<PathBuf> {
    normalize_path(start)
        .ancestors()
        .find(|candidate| is_dataset(candidate))
        .map(Path::to_path_buf)
}

/// Per-dataset configuration file location
pub fn dataset_config_path(dataset: &Path) -> PathBuf {
    dataset.join(DATASET_CONFIG_DIR).join("config.toml")
}

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// file system
///
/// `..` at the root of an absolute path is dropped, as the OS does.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}
