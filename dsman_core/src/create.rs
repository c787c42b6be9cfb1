//! Create orchestrator
//!
//! Creates a new dataset: a git repository with an initialized annex and the
//! dsman configuration marker, optionally registered as subdataset of an
//! existing dataset.

use crate::dataset::{DATASET_CONFIG_DIR, dataset_config_path, is_dataset, normalize_path, resolve_path};
use crate::error::{IoError, Result};
use crate::status::{Status, StatusRecord};
use crate::vcs::Vcs;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Action name of create records
pub const ACTION: &str = "create";

const CONFIG_TEMPLATE: &str = "# dsman dataset configuration\n";

/// Parameters of one create invocation
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Location of the new dataset, relative ones are taken against `dataset`
    pub path: PathBuf,
    /// Dataset to register the new dataset in
    pub dataset: Option<PathBuf>,
    /// Annex description
    pub description: Option<String>,
    /// Plain git repository without annex
    pub no_annex: bool,
}

impl CreateRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Orchestrates dataset creation
pub struct CreateOrchestrator {
    vcs: Arc<dyn Vcs>,
}

impl CreateOrchestrator {
    pub fn new(vcs: Arc<dyn Vcs>) -> Self {
        Self { vcs }
    }

    pub async fn create(&self, request: &CreateRequest) -> Result<StatusRecord> {
        let cwd = std::env::current_dir()?;
        let dataset = match &request.dataset {
            Some(dataset) => {
                let dataset = resolve_path(dataset, &cwd);
                if !is_dataset(&dataset) {
                    return Err(IoError::not_a_dataset(&dataset).into());
                }
                Some(dataset)
            }
            None => None,
        };

        let path = normalize_path(&resolve_path(
            &request.path,
            dataset.as_deref().unwrap_or(&cwd),
        ));
        let mut record = StatusRecord::ok(ACTION, &path);
        if let Some(dataset) = &dataset {
            record = record.with_refds(dataset);
        }

        if self.vcs.is_installed(&path).await {
            return Ok(error(
                record,
                format!("dataset already exists at {}", path.display()),
            ));
        }
        if has_entries(&path)? {
            return Ok(error(
                record,
                "target path already exists and is not empty, refuse to create a dataset in it"
                    .to_string(),
            ));
        }
        let relative = match &dataset {
            Some(dataset) => match path.strip_prefix(dataset) {
                Ok(relative) if !relative.as_os_str().is_empty() => Some(relative.to_path_buf()),
                _ => {
                    return Ok(error(
                        record,
                        format!(
                            "path '{}' is not inside dataset '{}'",
                            path.display(),
                            dataset.display()
                        ),
                    ));
                }
            },
            None => None,
        };

        if let Err(e) = self.initialize(&path, request).await {
            return Ok(error(record, format!("Cannot create dataset: {e}")));
        }

        if let (Some(dataset), Some(relative)) = (&dataset, &relative)
            && let Err(e) = self.register(dataset, relative).await
        {
            return Ok(error(
                record,
                format!("Cannot register in {}: {e}", dataset.display()),
            ));
        }

        info!("Created dataset at {}", path.display());
        Ok(record)
    }

    async fn initialize(&self, path: &Path, request: &CreateRequest) -> Result<()> {
        self.vcs.init(path).await?;
        if request.no_annex {
            debug!("Skipping annex initialization of {}", path.display());
        } else {
            self.vcs
                .annex_init(path, request.description.as_deref())
                .await?;
        }

        tokio::fs::create_dir_all(path.join(DATASET_CONFIG_DIR)).await?;
        tokio::fs::write(dataset_config_path(path), CONFIG_TEMPLATE).await?;
        self.vcs.commit_all(path, "Create dataset").await
    }

    async fn register(&self, dataset: &Path, relative: &Path) -> Result<()> {
        let url = format!("./{}", relative_url(relative));
        self.vcs.submodule_add(dataset, relative, &url).await?;
        self.vcs
            .commit_all(
                dataset,
                &format!("Register subdataset {}", relative.display()),
            )
            .await
    }
}

fn error(mut record: StatusRecord, message: String) -> StatusRecord {
    record.status = Status::Error;
    record.with_message(message)
}

fn has_entries(path: &Path) -> Result<bool> {
    match std::fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(IoError::from_std(e).with_path(path).into()),
    }
}

/// Forward-slash form of a relative path, as used in submodule URLs
fn relative_url(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
