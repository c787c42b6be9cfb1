//! Mock implementation of the Vcs trait

use async_trait::async_trait;
use dsman_core::annex::AnnexMode;
use dsman_core::error::CommandError;
use dsman_core::{Result, Vcs};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// UUID reported by `annex_whereis` for annexed files
pub const WEB_UUID: &str = "00000000-0000-0000-0000-000000000001";

/// Mock of git and git-annex operating on a real directory tree
///
/// Repositories are plain directories with an empty `.git` directory, so that
/// dataset discovery works on them. Remotes live in memory. Every call is
/// logged and can be inspected with [`MockVcs::calls`].
///
/// # Examples
///
/// ```rust,no_run
/// use dsman_test_utils::MockVcs;
/// use dsman_core::Vcs;
/// use std::path::Path;
///
/// # async fn example() -> dsman_core::Result<()> {
/// let vcs = MockVcs::new();
/// vcs.fail_clone_from("https://example.com/broken");
///
/// vcs.init(Path::new("/tmp/ds")).await?;
/// assert!(vcs.calls().contains(&"init /tmp/ds".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MockVcs {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    remotes: HashMap<PathBuf, BTreeMap<String, String>>,
    config: HashMap<PathBuf, BTreeMap<String, String>>,
    failing_clone_urls: HashSet<String>,
    failing_operations: HashSet<String>,
    git_suffixes: Vec<String>,
    annex_branch: bool,
    calls: Vec<String>,
}

impl MockVcs {
    /// Create a mock where every operation succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make clones from `url` fail
    pub fn fail_clone_from(&self, url: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_clone_urls
            .insert(url.to_string());
    }

    /// Make every call of `operation` (e.g. `"annex_init"`) fail
    pub fn fail_operation(&self, operation: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_operations
            .insert(operation.to_string());
    }

    /// Files ending in `suffix` are stored in git rather than the annex
    pub fn store_in_git(&self, suffix: &str) {
        self.state
            .lock()
            .unwrap()
            .git_suffixes
            .push(suffix.to_string());
    }

    /// Whether cloned repositories carry a git-annex branch
    pub fn set_annex_branch(&self, present: bool) {
        self.state.lock().unwrap().annex_branch = present;
    }

    /// Register a remote without logging a call
    pub fn preset_remote(&self, path: &Path, name: &str, url: &str) {
        self.state
            .lock()
            .unwrap()
            .remotes
            .entry(path.to_path_buf())
            .or_default()
            .insert(name.to_string(), url.to_string());
    }

    /// All remotes of a repository
    pub fn remotes_of(&self, path: &Path) -> BTreeMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .remotes
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// A configuration value set through the mock
    pub fn config_value(&self, path: &Path, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .config
            .get(path)
            .and_then(|config| config.get(key).cloned())
    }

    /// Log of calls, one `"<operation> <path> [args...]"` line per call
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls of one operation
    pub fn calls_of(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{operation} ");
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(&prefix))
            .collect()
    }

    fn record(&self, operation: &str, path: &Path, args: &[&str]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut call = format!("{operation} {}", path.display());
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        state.calls.push(call);

        if state.failing_operations.contains(operation) {
            return Err(CommandError::failed(
                "git",
                &[operation.to_string()],
                Some(1),
                "mock failure",
            )
            .into());
        }
        Ok(())
    }
}

fn make_repository(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path.join(".git"))?;
    Ok(())
}

#[async_trait]
impl Vcs for MockVcs {
    async fn init(&self, path: &Path) -> Result<()> {
        self.record("init", path, &[])?;
        make_repository(path)
    }

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.record("clone", dest, &[url])?;

        let fails = self
            .state
            .lock()
            .unwrap()
            .failing_clone_urls
            .contains(url);
        if fails {
            // Leave a partial destination behind, as a real failed clone may
            std::fs::create_dir_all(dest)?;
            std::fs::write(dest.join("partial"), b"")?;
            return Err(CommandError::failed(
                "git",
                &["clone".to_string(), url.to_string()],
                Some(128),
                "fatal: repository not found",
            )
            .into());
        }

        make_repository(dest)?;
        self.preset_remote(dest, "origin", url);
        Ok(())
    }

    async fn remotes(&self, path: &Path) -> Result<Vec<String>> {
        self.record("remotes", path, &[])?;
        Ok(self.remotes_of(path).into_keys().collect())
    }

    async fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>> {
        self.record("remote_url", path, &[name])?;
        Ok(self.remotes_of(path).remove(name))
    }

    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        self.record("add_remote", path, &[name, url])?;
        self.preset_remote(path, name, url);
        Ok(())
    }

    async fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        self.record("set_remote_url", path, &[name, url])?;
        self.preset_remote(path, name, url);
        Ok(())
    }

    async fn set_config(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        self.record("set_config", path, &[key, value])?;
        self.state
            .lock()
            .unwrap()
            .config
            .entry(path.to_path_buf())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn submodule_add(&self, superds: &Path, relative: &Path, url: &str) -> Result<()> {
        let relative = relative.to_string_lossy();
        self.record("submodule_add", superds, &[&relative, url])
    }

    async fn commit_all(&self, path: &Path, message: &str) -> Result<()> {
        self.record("commit_all", path, &[message])
    }

    async fn has_annex_branch(&self, path: &Path) -> Result<bool> {
        self.record("has_annex_branch", path, &[])?;
        Ok(self.state.lock().unwrap().annex_branch)
    }

    async fn annex_init(&self, path: &Path, description: Option<&str>) -> Result<()> {
        self.record("annex_init", path, &[description.unwrap_or("")])
    }

    async fn annex_addurl(
        &self,
        path: &Path,
        url: &str,
        file: &Path,
        mode: AnnexMode,
        options: &[String],
    ) -> Result<()> {
        let file_name = file.to_string_lossy();
        let mut args = vec![url, &file_name, mode.as_str()];
        args.extend(options.iter().map(String::as_str));
        self.record("annex_addurl", path, &args)?;

        let target = path.join(file);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = if mode.downloads() {
            format!("content of {url}")
        } else {
            String::new()
        };
        std::fs::write(target, content)?;
        Ok(())
    }

    async fn annex_whereis(&self, path: &Path, file: &Path) -> Result<Vec<String>> {
        let file_name = file.to_string_lossy();
        self.record("annex_whereis", path, &[&file_name])?;

        let state = self.state.lock().unwrap();
        let in_git = state
            .git_suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()));
        if in_git {
            Ok(Vec::new())
        } else {
            Ok(vec![WEB_UUID.to_string()])
        }
    }
}
