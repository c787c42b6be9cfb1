//! Mock implementations for testing

mod probe;
mod site;
mod vcs;

pub use probe::MockUrlProbe;
pub use site::{MockGitLabSite, SiteBehavior, SiteCall, created_attributes};
pub use vcs::{MockVcs, WEB_UUID};
