//! dsman command-line interface library
//!
//! Configuration loading, error reporting, output rendering and the command
//! orchestrators used by the `dsman` binary.

pub mod config;
pub mod error;
pub mod orchestrators;
pub mod output;
pub mod paths;
pub mod terminal;
