//! Create-sibling orchestrator
//!
//! Publishes datasets to a GitLab site. Work happens in two phases:
//!
//! 1. [`CreateSiblingOrchestrator::plan`] validates the invocation, discovers
//!    the dataset tree and resolves site settings. Every usage or
//!    configuration problem surfaces here, before any remote interaction.
//! 2. [`CreateSiblingOrchestrator::execute`] walks the planned datasets one at
//!    a time, talks to the site and the VCS, and reports one or more
//!    [`StatusRecord`]s per dataset. Failures of a single dataset never abort
//!    the batch.

use super::resolver::SiblingPathResolver;
use super::site::{GitLabConfig, SiteLookup, SiteRequest, SiteSettings, site_key};
use crate::dataset::{DatasetId, DatasetTree, normalize_path, resolve_path};
use crate::error::{ConfigError, RemoteError, Result, ValidationError};
use crate::gitlab::{GitLabSite, ProjectAttributes};
use crate::status::{Status, StatusRecord};
use crate::vcs::Vcs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Action name of records about the remote project
pub const ACTION: &str = "create_sibling_gitlab";

/// Action name of records about the local remote configuration
pub const CONFIGURE_ACTION: &str = "configure-sibling";

/// What to do when a dataset already has a remote with the sibling name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Report an error for that dataset
    #[default]
    Error,
    /// Leave the dataset alone
    Skip,
    /// Point the existing remote at the project
    Reconfigure,
}

impl ExistingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Skip => "skip",
            Self::Reconfigure => "reconfigure",
        }
    }
}

impl fmt::Display for ExistingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExistingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "skip" => Ok(Self::Skip),
            "reconfigure" => Ok(Self::Reconfigure),
            other => Err(ConfigError::invalid_existing(other)),
        }
    }
}

/// Parameters of one create-sibling invocation
#[derive(Debug, Clone, Default)]
pub struct CreateSiblingRequest {
    /// Reference dataset; its configuration drives all datasets below it
    pub dataset: PathBuf,
    /// Paths selecting datasets, relative ones are taken against `dataset`
    pub paths: Vec<PathBuf>,
    pub site: Option<String>,
    /// Explicit project path, used verbatim
    pub project: Option<String>,
    pub layout: Option<String>,
    pub access: Option<String>,
    /// Sibling (remote) name
    pub name: Option<String>,
    pub existing: ExistingPolicy,
    pub recursive: bool,
    pub description: Option<String>,
    pub dry_run: bool,
}

impl CreateSiblingRequest {
    pub fn new(dataset: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Default::default()
        }
    }
}

/// A validated invocation, ready to be executed
#[derive(Debug, Clone)]
pub struct SiblingPlan {
    tree: DatasetTree,
    targets: Vec<DatasetId>,
    settings: SiteSettings,
    project: Option<String>,
    existing: ExistingPolicy,
    description: Option<String>,
    dry_run: bool,
}

impl SiblingPlan {
    /// Resolved site settings
    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Locations of the datasets that will be processed, in processing order
    pub fn dataset_paths(&self) -> Vec<&Path> {
        self.targets.iter().map(|id| self.tree.path(*id)).collect()
    }
}

/// Everything known about one dataset while it is processed
struct DatasetContext<'p> {
    path: &'p Path,
    has_remote: bool,
    project: String,
}

/// Orchestrates sibling creation over a dataset hierarchy
pub struct CreateSiblingOrchestrator {
    vcs: Arc<dyn Vcs>,
}

impl CreateSiblingOrchestrator {
    pub fn new(vcs: Arc<dyn Vcs>) -> Self {
        Self { vcs }
    }

    /// Validate `request` against `config` without touching any remote
    pub fn plan(&self, request: &CreateSiblingRequest, config: &GitLabConfig) -> Result<SiblingPlan> {
        if request.project.is_some() && request.recursive {
            return Err(ValidationError::mutually_exclusive("project", "recursive").into());
        }
        if request.project.is_some() && request.paths.len() > 1 {
            return Err(ValidationError::mutually_exclusive("project", "multiple paths").into());
        }

        let settings = SiteLookup::new(config).resolve(&SiteRequest {
            site: request.site.clone(),
            name: request.name.clone(),
            project: None,
            layout: request.layout.clone(),
            access: request.access.clone(),
        })?;
        debug!("Resolved sibling settings: {settings:?}");

        let tree = DatasetTree::discover(&request.dataset)?;
        let targets = select_targets(&tree, &request.paths, request.recursive)?;
        debug!("Planned {} dataset(s)", targets.len());

        Ok(SiblingPlan {
            tree,
            targets,
            settings,
            project: request.project.clone(),
            existing: request.existing,
            description: request.description.clone(),
            dry_run: request.dry_run,
        })
    }

    /// Validate and execute in one go
    pub async fn run(
        &self,
        request: &CreateSiblingRequest,
        config: &GitLabConfig,
        site: &dyn GitLabSite,
    ) -> Result<Vec<StatusRecord>> {
        let plan = self.plan(request, config)?;
        self.execute(&plan, Some(site)).await
    }

    /// Process every planned dataset
    ///
    /// `site` may only be `None` for a dry run.
    pub async fn execute(
        &self,
        plan: &SiblingPlan,
        site: Option<&dyn GitLabSite>,
    ) -> Result<Vec<StatusRecord>> {
        if site.is_none() && !plan.dry_run {
            return Err(RemoteError::not_configured(
                &plan.settings.site,
                "no site client available",
            )
            .into());
        }

        let resolver = SiblingPathResolver::new(
            &plan.tree,
            plan.settings.layout,
            plan.settings.project_root.clone(),
        );

        let mut records = Vec::new();
        for id in &plan.targets {
            self.process_dataset(plan, &resolver, *id, site, &mut records)
                .await;
        }
        Ok(records)
    }

    fn base_record(&self, plan: &SiblingPlan, path: &Path) -> StatusRecord {
        StatusRecord::ok(ACTION, path)
            .with_refds(plan.tree.path(plan.tree.root()))
            .with_site(&plan.settings.site)
            .with_sibling(&plan.settings.sibling_name)
            .with_description(plan.description.clone())
    }

    async fn process_dataset(
        &self,
        plan: &SiblingPlan,
        resolver: &SiblingPathResolver<'_>,
        id: DatasetId,
        site: Option<&dyn GitLabSite>,
        records: &mut Vec<StatusRecord>,
    ) {
        let path = plan.tree.path(id);
        let name = &plan.settings.sibling_name;
        let mut record = self.base_record(plan, path);

        let has_remote = match self.vcs.remotes(path).await {
            Ok(remotes) => remotes.iter().any(|remote| remote == name),
            Err(e) => {
                records.push(error_record(record, format!("Cannot list remotes: {e}")));
                return;
            }
        };

        if has_remote {
            let message = format!("already has a configured sibling \"{name}\"");
            match plan.existing {
                ExistingPolicy::Skip => {
                    debug!("Skipping {}: {message}", path.display());
                    record.status = Status::NotNeeded;
                    records.push(record.with_message(message));
                    return;
                }
                ExistingPolicy::Error => {
                    records.push(error_record(record, message));
                    return;
                }
                ExistingPolicy::Reconfigure => {
                    debug!("Reconfiguring sibling '{name}' of {}", path.display());
                }
            }
        }

        let project = match &plan.project {
            Some(project) => project.clone(),
            None => match resolver.project_for(id) {
                Ok(project) => project,
                Err(_) => {
                    let key = site_key(&plan.settings.site, "project");
                    records.push(error_record(
                        record,
                        format!(
                            "No project name/location specified, and no '{key}' configured to derive one"
                        ),
                    ));
                    return;
                }
            },
        };
        record = record.with_project(&project);

        if plan.dry_run {
            records.push(record.with_message("dry run, no project created"));
            return;
        }
        let Some(site) = site else {
            return;
        };

        let context = DatasetContext {
            path,
            has_remote,
            project,
        };
        let Some(attributes) = self
            .ensure_project(plan, site, &context, record, records)
            .await
        else {
            return;
        };

        records.push(self.configure_sibling(plan, &context, &attributes).await);
    }

    /// Look up or create the remote project, `None` when processing of the
    /// dataset has to stop
    async fn ensure_project(
        &self,
        plan: &SiblingPlan,
        site: &dyn GitLabSite,
        context: &DatasetContext<'_>,
        record: StatusRecord,
        records: &mut Vec<StatusRecord>,
    ) -> Option<ProjectAttributes> {
        let name = &plan.settings.sibling_name;
        let project = &context.project;

        match site.get_project(project).await {
            Ok(Some(attributes)) => {
                if plan.existing != ExistingPolicy::Reconfigure {
                    let message = format!(
                        "There is already a project at '{project}' on site '{}', but no sibling with name '{name}' is configured, maybe use --existing=reconfigure",
                        plan.settings.site
                    );
                    records.push(error_record(
                        record.with_project_attributes(attributes),
                        message,
                    ));
                    return None;
                }
                debug!("Project '{project}' already exists");
                Some(attributes)
            }
            Ok(None) => match site
                .create_project(project, plan.description.as_deref())
                .await
            {
                Ok(attributes) => {
                    info!("Created project '{project}' on site '{}'", plan.settings.site);
                    let url = attributes.repo_url(plan.settings.access).to_string();
                    records.push(
                        record
                            .with_project_attributes(attributes.clone())
                            .with_message(format!("sibling repository '{name}' created at {url}")),
                    );
                    Some(attributes)
                }
                Err(e) => {
                    warn!("Failed to create project '{project}': {e}");
                    records.push(error_record(
                        record,
                        format!("Failed to create GitLab project: {e}"),
                    ));
                    None
                }
            },
            Err(e) => {
                records.push(error_record(
                    record,
                    format!("Failed to query GitLab project: {e}"),
                ));
                None
            }
        }
    }

    /// Register (or repoint) the remote of a dataset
    async fn configure_sibling(
        &self,
        plan: &SiblingPlan,
        context: &DatasetContext<'_>,
        attributes: &ProjectAttributes,
    ) -> StatusRecord {
        let name = &plan.settings.sibling_name;
        let url = attributes.repo_url(plan.settings.access);
        let record = StatusRecord::ok(CONFIGURE_ACTION, context.path)
            .with_refds(plan.tree.path(plan.tree.root()))
            .with_name(name)
            .with_url(url);

        // Keep git-annex from treating the hosting site as a content store
        let annex_ignore = format!("remote.{name}.annex-ignore");
        let result = match self.vcs.set_config(context.path, &annex_ignore, "true").await {
            Ok(()) if context.has_remote => {
                self.vcs.set_remote_url(context.path, name, url).await
            }
            Ok(()) => self.vcs.add_remote(context.path, name, url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => record,
            Err(e) => error_record(record, format!("Cannot configure sibling: {e}")),
        }
    }
}

fn error_record(mut record: StatusRecord, message: String) -> StatusRecord {
    record.status = Status::Error;
    record.with_message(message)
}

/// Datasets selected by `paths`, each at most once, in a stable order
///
/// A path naming a dataset selects it. A plain directory selects the topmost
/// datasets below it, or the dataset containing it when there are none. No
/// paths select the root.
fn select_targets(tree: &DatasetTree, paths: &[PathBuf], recursive: bool) -> Result<Vec<DatasetId>> {
    let root_path = tree.path(tree.root()).to_path_buf();
    let mut selected = Vec::new();

    if paths.is_empty() {
        selected.push(tree.root());
    }
    for path in paths {
        let path = normalize_path(&resolve_path(path, &root_path));
        if !path.starts_with(&root_path) {
            return Err(ValidationError::outside_dataset(&path, &root_path).into());
        }

        if let Some(id) = tree.find(&path) {
            selected.push(id);
            continue;
        }

        let below: Vec<DatasetId> = tree
            .ids()
            .filter(|id| tree.path(*id).starts_with(&path))
            .filter(|id| {
                tree.parent(*id)
                    .is_none_or(|parent| !tree.path(parent).starts_with(&path))
            })
            .collect();
        if below.is_empty() {
            if let Some(id) = tree.containing(&path) {
                selected.push(id);
            }
        } else {
            let mut below = below;
            below.sort_by_key(|id| tree.relative_path(*id));
            selected.extend(below);
        }
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for id in selected {
        let scope = std::iter::once(id).chain(if recursive {
            tree.descendants(id)
        } else {
            Vec::new()
        });
        for id in scope {
            if seen.insert(id) {
                targets.push(id);
            }
        }
    }
    Ok(targets)
}
