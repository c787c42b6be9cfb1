//! GitLab hosting site access
//!
//! The create-sibling orchestrator only needs two questions answered by a
//! site: does a project exist at a path, and please create one. [`GitLabSite`]
//! captures exactly that; [`GitLabClient`] answers it over the REST API.

mod client;

pub use client::{DEFAULT_TIMEOUT, GitLabClient};

use crate::error::Result;
use crate::sibling::Access;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes of a project on the hosting site
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectAttributes {
    pub http_url_to_repo: String,
    pub ssh_url_to_repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Everything else the site reported
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectAttributes {
    pub fn new(http_url_to_repo: impl Into<String>, ssh_url_to_repo: impl Into<String>) -> Self {
        Self {
            http_url_to_repo: http_url_to_repo.into(),
            ssh_url_to_repo: ssh_url_to_repo.into(),
            description: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Repository URL to register for the given access mode
    pub fn repo_url(&self, access: Access) -> &str {
        match access {
            Access::Http => &self.http_url_to_repo,
            Access::Ssh => &self.ssh_url_to_repo,
        }
    }
}

/// A hosting site able to look up and create projects
#[async_trait]
pub trait GitLabSite: Send + Sync {
    /// Project at `path`, `None` when it does not exist
    async fn get_project(&self, path: &str) -> Result<Option<ProjectAttributes>>;

    /// Create a project at `path`, creating missing groups along the way
    async fn create_project(
        &self,
        path: &str,
        description: Option<&str>,
    ) -> Result<ProjectAttributes>;
}
