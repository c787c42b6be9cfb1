//! Discovering a dataset hierarchy on disk
//!
//! Walks the directory tree below a root dataset with walkdir and registers
//! every directory carrying a `.git` entry as a subdataset of the deepest
//! dataset above it.

use super::{DatasetTree, VCS_DIR, is_dataset};
use crate::error::{IoError, Result};
use log::{debug, trace};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

impl DatasetTree {
    /// Build the tree of `root` and every dataset nested below it
    ///
    /// Entries are visited sorted by file name, so a parent is always
    /// registered before anything inside it. VCS metadata directories are
    /// never entered.
    pub fn discover(root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(IoError::path_not_found(root).into());
        }
        if !is_dataset(root) {
            return Err(IoError::not_a_dataset(root).into());
        }

        let root = super::normalize_path(root);
        let mut tree = DatasetTree::new(&root);
        debug!("Discovering datasets below {}", root.display());

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_vcs_dir(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf);
                let mut error = IoError::from_std(std::io::Error::other(e.to_string()));
                if let Some(path) = path {
                    error = error.with_path(&path);
                }
                error
            })?;

            if !entry.file_type().is_dir() || !is_dataset(entry.path()) {
                continue;
            }

            let path = super::normalize_path(entry.path());
            let parent = tree
                .containing(&path)
                .ok_or_else(|| IoError::path_not_found(&path))?;
            let relative = path
                .strip_prefix(tree.path(parent))
                .map(Path::to_path_buf)
                .map_err(|_| IoError::path_not_found(&path))?;

            trace!(
                "Found dataset {} below {}",
                relative.display(),
                tree.path(parent).display()
            );
            tree.add_child(parent, relative)?;
        }

        debug!("Discovered {} dataset(s)", tree.len());
        Ok(tree)
    }
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.file_name() == VCS_DIR
}
