//! Sibling management for hosting sites
//!
//! This module handles everything needed to publish datasets to GitLab:
//! - Project naming layouts and path resolution over a dataset tree
//! - Layered per-site configuration lookup
//! - The create-sibling orchestrator tying resolver, site client and VCS together

pub mod layout;
pub mod orchestrator;
pub mod resolver;
pub mod site;

// Re-export main types
pub use layout::Layout;
pub use orchestrator::{CreateSiblingOrchestrator, CreateSiblingRequest, ExistingPolicy};
pub use resolver::{ProjectTarget, SiblingPathResolver};
pub use site::{Access, GitLabConfig, SiteConfig, SiteLookup, SiteRequest, SiteSettings};
