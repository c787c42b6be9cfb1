//! URL-to-file annexing node

use super::files_db::FilesDb;
use super::probe::UrlProbe;
use super::{ActivityStats, AnnexMode};
use crate::dataset::is_dataset;
use crate::error::{IoError, Result, ValidationError};
use crate::vcs::Vcs;
use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// One URL to be stored in a dataset file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexInput {
    pub url: String,
    /// Target file, relative to the dataset
    pub filename: PathBuf,
    /// Statistics carried along and updated by processing
    pub stats: ActivityStats,
}

impl AnnexInput {
    pub fn new(url: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            stats: ActivityStats::default(),
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: ActivityStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Adds URLs to files of one dataset
///
/// The status of every URL is remembered in the dataset's files database.
/// A URL whose status did not change since it was last added is skipped.
pub struct Annexificator {
    repo: PathBuf,
    mode: AnnexMode,
    options: Vec<String>,
    yield_non_updated: bool,
    vcs: Arc<dyn Vcs>,
    probe: Arc<dyn UrlProbe>,
    db: FilesDb,
}

impl Annexificator {
    /// Create an annexificator for the dataset at `repo`
    pub async fn new(
        repo: impl Into<PathBuf>,
        vcs: Arc<dyn Vcs>,
        probe: Arc<dyn UrlProbe>,
    ) -> Result<Self> {
        let repo = repo.into();
        if !is_dataset(&repo) {
            return Err(IoError::not_a_dataset(&repo).into());
        }
        let db = FilesDb::load(&repo).await?;
        debug!(
            "Loaded files database of {} with {} entries",
            repo.display(),
            db.len()
        );

        Ok(Self {
            repo,
            mode: AnnexMode::default(),
            options: Vec::new(),
            yield_non_updated: false,
            vcs,
            probe,
            db,
        })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: AnnexMode) -> Self {
        self.mode = mode;
        self
    }

    /// Extra options passed to every `git annex addurl` call
    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_yield_non_updated(mut self, yield_non_updated: bool) -> Self {
        self.yield_non_updated = yield_non_updated;
        self
    }

    /// Whether inputs that needed no update are handed back by [`Self::process`]
    pub fn set_yield_non_updated(&mut self, yield_non_updated: bool) {
        self.yield_non_updated = yield_non_updated;
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    pub fn mode(&self) -> AnnexMode {
        self.mode
    }

    /// Add `input.url` to `input.filename`
    ///
    /// Returns the input with updated statistics. An input whose URL did not
    /// change is only returned when non-updated inputs are yielded.
    pub async fn process(&mut self, mut input: AnnexInput) -> Result<Option<AnnexInput>> {
        let key = db_key(&input.filename)?;
        let target = self.repo.join(&input.filename);

        input.stats.files += 1;
        input.stats.urls += 1;

        let status = self.probe.status(&input.url).await?;
        let exists = tokio::fs::symlink_metadata(&target).await.is_ok();

        let unchanged = exists
            && self
                .db
                .get(&key)
                .is_some_and(|known| self.mode == AnnexMode::Relaxed || *known == status);
        if unchanged {
            debug!("{key} is up to date with {}", input.url);
            input.stats.skipped += 1;
            return Ok(self.yield_non_updated.then_some(input));
        }

        if exists {
            debug!("Replacing existing {key}");
            input.stats.overwritten += 1;
            tokio::fs::remove_file(&target)
                .await
                .map_err(|e| IoError::from_std(e).with_path(&target))?;
        } else if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let started = Instant::now();
        self.vcs
            .annex_addurl(
                &self.repo,
                &input.url,
                &input.filename,
                self.mode,
                &self.options,
            )
            .await?;

        if self.mode.downloads() {
            let size = match status.size {
                Some(size) => size,
                None => tokio::fs::metadata(&target)
                    .await
                    .map(|metadata| metadata.len())
                    .unwrap_or(0),
            };
            input.stats.downloaded += 1;
            input.stats.downloaded_size += size;
            input.stats.downloaded_time += started.elapsed();
        }

        let locations = self.vcs.annex_whereis(&self.repo, &input.filename).await?;
        if locations.is_empty() {
            input.stats.add_git += 1;
        } else {
            input.stats.add_annex += 1;
        }
        info!("Added {} as {key} ({} mode)", input.url, self.mode);

        self.db.set(key, status);
        self.db.save().await?;
        Ok(Some(input))
    }
}

/// Files database key of a dataset-relative filename
fn db_key(filename: &Path) -> Result<String> {
    let mut segments = Vec::new();
    for component in filename.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            Component::CurDir => {}
            _ => {
                return Err(ValidationError::invalid_relative_path(
                    filename,
                    "must stay inside the dataset",
                )
                .into());
            }
        }
    }
    if segments.is_empty() {
        return Err(ValidationError::invalid_relative_path(filename, "must not be empty").into());
    }
    Ok(segments.join("/"))
}
