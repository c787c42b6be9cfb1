//! Status records emitted by every orchestrator
//!
//! Orchestrators never fail half-way through a batch of datasets. Each dataset
//! in scope produces one or more [`StatusRecord`]s describing what happened,
//! and the caller decides how to render them and which exit code to use.

use crate::gitlab::ProjectAttributes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of one action on one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The action was carried out
    Ok,
    /// Nothing had to be done
    NotNeeded,
    /// The action cannot be carried out in the current state
    Impossible,
    /// The action was attempted and failed
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotNeeded => "notneeded",
            Self::Impossible => "impossible",
            Self::Error => "error",
        }
    }

    /// Whether this status should make the command exit unsuccessfully
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Impossible | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of the entity a record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Dataset,
    File,
}

/// Result of a single action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub action: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Reference dataset of the invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refds: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Remote name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_attributes: Option<ProjectAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StatusRecord {
    /// Create a dataset record with no optional fields set
    pub fn new(action: impl Into<String>, path: impl AsRef<Path>, status: Status) -> Self {
        Self {
            action: action.into(),
            path: path.as_ref().to_path_buf(),
            record_type: RecordType::Dataset,
            status,
            message: None,
            refds: None,
            site: None,
            sibling: None,
            project: None,
            description: None,
            project_attributes: None,
            name: None,
            url: None,
        }
    }

    pub fn ok(action: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::new(action, path, Status::Ok)
    }

    pub fn notneeded(action: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::new(action, path, Status::NotNeeded)
    }

    pub fn impossible(action: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::new(action, path, Status::Impossible)
    }

    pub fn error(action: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::new(action, path, Status::Error)
    }

    #[must_use]
    pub fn with_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_refds(mut self, refds: impl AsRef<Path>) -> Self {
        self.refds = Some(refds.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    #[must_use]
    pub fn with_sibling(mut self, sibling: impl Into<String>) -> Self {
        self.sibling = Some(sibling.into());
        self
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_project_attributes(mut self, attributes: ProjectAttributes) -> Self {
        self.project_attributes = Some(attributes);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// True when any record reports a failure
pub fn any_failed<'a>(records: impl IntoIterator<Item = &'a StatusRecord>) -> bool {
    records.into_iter().any(|record| record.status.is_failure())
}
