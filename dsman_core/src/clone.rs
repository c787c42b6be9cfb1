//! Clone orchestrator
//!
//! Installs a dataset from a URL or local path, optionally as a subdataset of
//! an existing dataset. Several candidate URLs are derived from the source and
//! tried in order.

use crate::dataset::{is_dataset, normalize_path, resolve_path};
use crate::error::{IoError, Result, ValidationError};
use crate::status::{Status, StatusRecord};
use crate::vcs::Vcs;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Action name of clone records
pub const ACTION: &str = "clone";

/// Parameters of one clone invocation
#[derive(Debug, Clone, Default)]
pub struct CloneRequest {
    /// URL or local path to clone from
    pub source: String,
    /// Destination; derived from the source when absent
    pub path: Option<PathBuf>,
    /// Dataset to register the clone in
    pub dataset: Option<PathBuf>,
    /// Annex description of the new clone
    pub description: Option<String>,
}

impl CloneRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }
}

/// Orchestrates cloning of a dataset
pub struct CloneOrchestrator {
    vcs: Arc<dyn Vcs>,
}

impl CloneOrchestrator {
    pub fn new(vcs: Arc<dyn Vcs>) -> Self {
        Self { vcs }
    }

    /// Clone `request.source`
    ///
    /// Invalid invocations fail with an error. Every other outcome is
    /// reported as a status record.
    pub async fn clone(&self, request: &CloneRequest) -> Result<StatusRecord> {
        if let Some(path) = &request.path
            && path.as_os_str() == request.source.as_str()
        {
            return Err(ValidationError::invalid_parameter(
                "path",
                "clone source and destination path are identical",
            )
            .into());
        }

        let dataset = match &request.dataset {
            Some(dataset) => {
                let dataset = normalize_path(&absolute(dataset)?);
                if !is_dataset(&dataset) {
                    return Err(IoError::not_a_dataset(&dataset).into());
                }
                Some(dataset)
            }
            None => None,
        };
        let base = match &dataset {
            Some(dataset) => dataset.clone(),
            None => std::env::current_dir()?,
        };

        let source = git_url_from_source(&request.source, &base);
        debug!("Resolved clone source from '{}' to '{source}'", request.source);

        let destination = match &request.path {
            Some(path) => resolve_path(path, &base),
            None => resolve_path(Path::new(&installation_path_from_url(&source)?), &base),
        };
        debug!("Resolved clone target path to {}", destination.display());

        let mut record = StatusRecord::ok(ACTION, &destination);
        if let Some(dataset) = &dataset {
            record = record.with_refds(dataset);
        }

        let candidates = source_candidates(&source);

        if is_non_empty_dir(&destination).await? {
            if self.vcs.is_installed(&destination).await
                && let Ok(Some(origin)) = self.vcs.remote_url(&destination, "origin").await
                && (candidates.contains(&origin)
                    || candidates.contains(&git_url_from_source(&origin, &destination)))
            {
                record.status = Status::NotNeeded;
                return Ok(record.with_message(format!(
                    "dataset {} was already cloned from '{source}'",
                    destination.display()
                )));
            }
            return Ok(error(
                record,
                "target path already exists and not empty, refuse to clone into target path"
                    .to_string(),
            ));
        }

        if let Some(dataset) = &dataset
            && !destination.starts_with(dataset)
        {
            return Ok(error(
                record,
                format!(
                    "clone target path '{}' not in specified target dataset '{}'",
                    destination.display(),
                    dataset.display()
                ),
            ));
        }

        let Some(used) = self.try_candidates(&candidates, &destination).await else {
            return Ok(error(
                record,
                format!(
                    "Failed to clone data from any candidate source URL: {}",
                    candidates.join(", ")
                ),
            ));
        };
        record = record.with_url(&used);

        if let Some(dataset) = &dataset
            && let Err(e) = self.register(dataset, &destination, &used).await
        {
            return Ok(error(record, format!("Cannot register in {}: {e}", dataset.display())));
        }

        if let Err(e) = self.init_annex(&destination, request.description.as_deref()).await {
            return Ok(error(record, format!("Cannot initialize annex: {e}")));
        }

        info!("Cloned {used} to {}", destination.display());
        Ok(record)
    }

    /// Try every candidate until one clones, wiping failed attempts
    async fn try_candidates(&self, candidates: &[String], destination: &Path) -> Option<String> {
        for candidate in candidates {
            info!(
                "Attempting to clone dataset from '{candidate}' to '{}'",
                destination.display()
            );
            match self.vcs.clone_repo(candidate, destination).await {
                Ok(()) if self.vcs.is_installed(destination).await => {
                    return Some(candidate.clone());
                }
                Ok(()) => debug!("Clone from '{candidate}' left no dataset behind"),
                Err(e) => debug!("Failed to clone from URL: {candidate} ({e})"),
            }

            if tokio::fs::symlink_metadata(destination).await.is_ok() {
                debug!(
                    "Wiping out unsuccessful clone attempt at: {}",
                    destination.display()
                );
                if let Err(e) = tokio::fs::remove_dir_all(destination).await {
                    debug!("Cannot remove {}: {e}", destination.display());
                }
            }
        }
        None
    }

    async fn register(&self, dataset: &Path, destination: &Path, url: &str) -> Result<()> {
        let relative = destination
            .strip_prefix(dataset)
            .map_err(|_| ValidationError::outside_dataset(destination, dataset))?;
        self.vcs.submodule_add(dataset, relative, url).await?;
        self.vcs
            .commit_all(
                dataset,
                &format!("Register subdataset {}", relative.display()),
            )
            .await
    }

    async fn init_annex(&self, destination: &Path, description: Option<&str>) -> Result<()> {
        if self.vcs.has_annex_branch(destination).await? {
            debug!("Initializing annex in {}", destination.display());
            self.vcs.annex_init(destination, description).await?;
        }
        Ok(())
    }
}

fn error(mut record: StatusRecord, message: String) -> StatusRecord {
    record.status = Status::Error;
    record.with_message(message)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

async fn is_non_empty_dir(path: &Path) -> Result<bool> {
    match tokio::fs::read_dir(path).await {
        Ok(mut entries) => Ok(entries.next_entry().await?.is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) if tokio::fs::symlink_metadata(path).await.is_ok() => {
            // Exists but is no directory
            debug!("{} is not a readable directory: {e}", path.display());
            Ok(true)
        }
        Err(e) => Err(IoError::from_std(e).with_path(path).into()),
    }
}

/// Turn a source into something git can clone from
///
/// `file://` URLs become local paths, existing local directories become
/// absolute paths; everything else is passed through.
pub fn git_url_from_source(source: &str, base: &Path) -> String {
    if let Ok(url) = Url::parse(source)
        && url.scheme() == "file"
        && let Ok(path) = url.to_file_path()
    {
        return path.to_string_lossy().into_owned();
    }

    let local = resolve_path(Path::new(source), base);
    if !source.contains("://") && local.is_dir() {
        return local.to_string_lossy().into_owned();
    }
    source.to_string()
}

/// Directory name `git clone` would pick for `source`
pub fn installation_path_from_url(source: &str) -> Result<String> {
    let mut trimmed = source.trim_end_matches('/');
    if let Some(stripped) = trimmed.strip_suffix("/.git") {
        trimmed = stripped.trim_end_matches('/');
    }

    let name = trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or(trimmed);
    let name = name.strip_suffix(".git").unwrap_or(name);

    if name.is_empty() || name == "." || name == ".." {
        return Err(ValidationError::invalid_parameter(
            "source",
            "cannot derive a destination path, give one explicitly",
        )
        .into());
    }
    Ok(name.to_string())
}

/// Sources to try, in order
pub fn source_candidates(source: &str) -> Vec<String> {
    let mut candidates = vec![source.to_string()];
    let trimmed = source.trim_end_matches('/');
    if !trimmed.ends_with(".git") {
        candidates.push(format!("{trimmed}/.git"));
    }
    candidates
}
