//! Version control and annex collaborators
//!
//! Orchestrators talk to git and git-annex only through the [`Vcs`] trait, so
//! they can be exercised against a mock in tests. [`GitCli`] is the production
//! implementation that spawns the external binaries.

mod git;

pub use git::GitCli;

use crate::annex::AnnexMode;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Name of the branch git-annex keeps its metadata on
pub const ANNEX_BRANCH: &str = "git-annex";

/// Operations on repositories needed by the orchestrators
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether `path` holds an installed dataset
    async fn is_installed(&self, path: &Path) -> bool {
        crate::dataset::is_dataset(path)
    }

    /// Create an empty repository at `path`, creating the directory if needed
    async fn init(&self, path: &Path) -> Result<()>;

    /// Clone `url` into `dest`
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Names of all configured remotes
    async fn remotes(&self, path: &Path) -> Result<Vec<String>>;

    /// URL of remote `name`, `None` when no such remote exists
    async fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>>;

    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()>;

    async fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<()>;

    /// Set a repository-local configuration value
    async fn set_config(&self, path: &Path, key: &str, value: &str) -> Result<()>;

    /// Register the repository at `relative` below `superds` as a submodule
    /// with the given URL
    async fn submodule_add(&self, superds: &Path, relative: &Path, url: &str) -> Result<()>;

    /// Stage everything and commit, doing nothing when the tree is clean
    async fn commit_all(&self, path: &Path, message: &str) -> Result<()>;

    /// Whether the repository (or one of its remotes) has an annex branch
    async fn has_annex_branch(&self, path: &Path) -> Result<bool>;

    async fn annex_init(&self, path: &Path, description: Option<&str>) -> Result<()>;

    /// Add `url` as the content source of `file`
    async fn annex_addurl(
        &self,
        path: &Path,
        url: &str,
        file: &Path,
        mode: AnnexMode,
        options: &[String],
    ) -> Result<()>;

    /// UUIDs of the repositories known to hold `file`, empty for files
    /// tracked directly by git
    async fn annex_whereis(&self, path: &Path, file: &Path) -> Result<Vec<String>>;
}
