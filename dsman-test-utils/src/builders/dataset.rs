//! Dataset hierarchies on disk

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Relative paths of the datasets in [`DatasetFixture::nested_collections`]
pub const NESTED_COLLECTIONS: [&str; 7] = [
    "",
    "subdir/collection1",
    "subdir/collection1/sub1",
    "subdir/collection1/sub2",
    "collection2",
    "collection2/sub1",
    "collection2/sub1/deepsub1",
];

/// A temporary directory holding a hierarchy of datasets
///
/// Datasets are directories with an empty `.git` directory, which is all
/// dataset discovery looks at.
///
/// # Examples
///
/// ```rust,no_run
/// use dsman_test_utils::DatasetFixture;
///
/// let fixture = DatasetFixture::nested_collections();
/// assert!(fixture.path("collection2/sub1").join(".git").is_dir());
/// ```
pub struct DatasetFixture {
    dir: TempDir,
}

impl DatasetFixture {
    /// A single root dataset
    pub fn single() -> Self {
        Self::with_datasets(&[""])
    }

    /// Root with two collections, one of them below a plain directory
    ///
    /// ```text
    /// root
    /// ├── subdir/collection1
    /// │   ├── sub1
    /// │   └── sub2
    /// └── collection2
    ///     └── sub1
    ///         └── deepsub1
    /// ```
    pub fn nested_collections() -> Self {
        Self::with_datasets(&NESTED_COLLECTIONS)
    }

    /// Datasets at the given relative paths, `""` being the root
    pub fn with_datasets(relative: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        for path in relative {
            std::fs::create_dir_all(root.join(path).join(".git")).unwrap();
        }
        Self { dir }
    }

    /// Root dataset
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("root")
    }

    /// Path below the root
    pub fn path(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            self.root()
        } else {
            self.root().join(relative)
        }
    }

    /// The temporary directory holding the root, for paths outside of it
    pub fn outside(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file below the root
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }
}
