//! dsman core library
//!
//! Dataset management on top of git, git-annex and GitLab: dataset
//! hierarchies, sibling project naming and publication, cloning, creation and
//! URL annexing. External tools are reached through the [`vcs::Vcs`] and
//! [`gitlab::GitLabSite`] traits.

pub mod annex;
pub mod clone;
pub mod create;
pub mod dataset;
pub mod error;
pub mod gitlab;
pub mod sibling;
pub mod status;
pub mod vcs;

// Re-export main types
pub use annex::{ActivityStats, AnnexInput, AnnexMode, Annexificator, HttpUrlProbe, UrlProbe};
pub use clone::{CloneOrchestrator, CloneRequest};
pub use create::{CreateOrchestrator, CreateRequest};
pub use dataset::{DatasetId, DatasetTree};
pub use error::{Error, Result};
pub use gitlab::{GitLabClient, GitLabSite, ProjectAttributes};
pub use sibling::{
    Access, CreateSiblingOrchestrator, CreateSiblingRequest, ExistingPolicy, GitLabConfig, Layout,
    ProjectTarget, SiblingPathResolver,
};
pub use status::{Status, StatusRecord};
pub use vcs::{GitCli, Vcs};
