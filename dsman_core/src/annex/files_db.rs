//! Persisted record of the last known source status of every file

use super::probe::UrlStatus;
use crate::dataset::DATASET_CONFIG_DIR;
use crate::error::{IoError, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Location of the database inside a dataset
///
/// Kept in the worktree, since `.git` may be a gitlink file in submodules.
pub fn files_db_path(repo: &Path) -> PathBuf {
    repo.join(DATASET_CONFIG_DIR).join("files-db.json")
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FilesDbContent {
    #[serde(default)]
    files: BTreeMap<String, UrlStatus>,
}

/// Filename → source status map, stored as JSON
#[derive(Debug)]
pub struct FilesDb {
    path: PathBuf,
    content: FilesDbContent,
}

impl FilesDb {
    /// Load the database of `repo`, starting empty when none exists
    pub async fn load(repo: &Path) -> Result<Self> {
        let path = files_db_path(repo);
        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                IoError::corrupt_data(&format!("files database: {e}")).with_path(&path)
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No files database at {}, starting empty", path.display());
                FilesDbContent::default()
            }
            Err(e) => return Err(IoError::from_std(e).with_path(&path).into()),
        };
        Ok(Self { path, content })
    }

    pub fn get(&self, filename: &str) -> Option<&UrlStatus> {
        self.content.files.get(filename)
    }

    pub fn set(&mut self, filename: impl Into<String>, status: UrlStatus) {
        self.content.files.insert(filename.into(), status);
    }

    pub fn len(&self) -> usize {
        self.content.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.files.is_empty()
    }

    /// Write the database back to disk
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&self.content)?;

        // Replace atomically
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        trace!("Saved {} file status(es) to {}", self.len(), self.path.display());
        Ok(())
    }
}
