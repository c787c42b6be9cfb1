//! Mock implementation of a GitLab site

use async_trait::async_trait;
use dsman_core::error::RemoteError;
use dsman_core::{GitLabSite, ProjectAttributes, Result};
use std::sync::{Arc, Mutex};

/// How the mock site answers
#[derive(Debug, Clone)]
pub enum SiteBehavior {
    /// No project exists; creation succeeds
    NewProject,
    /// A project with these attributes exists at every path
    ExistingProject(ProjectAttributes),
    /// No project exists; creation fails with this message
    CreateFailure(String),
}

/// A call made against the mock site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteCall {
    GetProject(String),
    CreateProject {
        path: String,
        description: Option<String>,
    },
}

/// Mock GitLab site recording every call
#[derive(Clone)]
pub struct MockGitLabSite {
    behavior: Arc<Mutex<SiteBehavior>>,
    calls: Arc<Mutex<Vec<SiteCall>>>,
}

impl MockGitLabSite {
    pub fn new(behavior: SiteBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_behavior(&self, behavior: SiteBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<SiteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Paths of all created projects, in call order
    pub fn created_projects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SiteCall::CreateProject { path, .. } => Some(path),
                SiteCall::GetProject(_) => None,
            })
            .collect()
    }
}

impl Default for MockGitLabSite {
    fn default() -> Self {
        Self::new(SiteBehavior::NewProject)
    }
}

/// Attributes the mock reports for a project created at `path`
pub fn created_attributes(path: &str) -> ProjectAttributes {
    ProjectAttributes::new(
        format!("http://gitlab.example.com/{path}.git"),
        format!("git@gitlab.example.com:{path}.git"),
    )
}

#[async_trait]
impl GitLabSite for MockGitLabSite {
    async fn get_project(&self, path: &str) -> Result<Option<ProjectAttributes>> {
        self.calls
            .lock()
            .unwrap()
            .push(SiteCall::GetProject(path.to_string()));

        match &*self.behavior.lock().unwrap() {
            SiteBehavior::ExistingProject(attributes) => Ok(Some(attributes.clone())),
            SiteBehavior::NewProject | SiteBehavior::CreateFailure(_) => Ok(None),
        }
    }

    async fn create_project(
        &self,
        path: &str,
        description: Option<&str>,
    ) -> Result<ProjectAttributes> {
        self.calls.lock().unwrap().push(SiteCall::CreateProject {
            path: path.to_string(),
            description: description.map(str::to_string),
        });

        match &*self.behavior.lock().unwrap() {
            SiteBehavior::CreateFailure(message) => {
                Err(RemoteError::server_error(400, message).into())
            }
            SiteBehavior::NewProject | SiteBehavior::ExistingProject(_) => Ok(
                created_attributes(path).with_description(description.map(str::to_string)),
            ),
        }
    }
}
