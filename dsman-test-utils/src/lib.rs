//! Test utilities for dsman
//!
//! This crate provides mock implementations of the external collaborators
//! (git, GitLab, URL probing) and builders for dataset hierarchies on disk.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::DatasetFixture;
pub use mocks::{MockGitLabSite, MockUrlProbe, MockVcs, SiteCall, SiteBehavior};
