//! Command orchestrators for business logic
//!
//! This module provides orchestrators that coordinate between the CLI layer
//! and the core library: they turn the loaded configuration into the
//! collaborators (hosting site client, URL probe) the core needs.

pub mod addurl_orchestrator;
pub mod sibling_orchestrator;
