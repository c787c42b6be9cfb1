//! Validation related error types

use std::path::PathBuf;
use thiserror::Error;

/// Invocation and input validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Two options that cannot be combined
    #[error("Options '{first}' and '{second}' are mutually exclusive")]
    MutuallyExclusive { first: String, second: String },

    /// Relative path that cannot address a node below its parent
    #[error("Invalid relative path '{path}': {reason}")]
    InvalidRelativePath { path: PathBuf, reason: String },

    /// Path lies outside of the dataset it was resolved against
    #[error("Path '{path}' is not inside dataset '{dataset}'")]
    OutsideDataset { path: PathBuf, dataset: PathBuf },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },
}

impl ValidationError {
    /// Create a mutually exclusive options error
    pub fn mutually_exclusive(first: &str, second: &str) -> Self {
        Self::MutuallyExclusive {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Create an invalid relative path error
    pub fn invalid_relative_path(path: &std::path::Path, reason: &str) -> Self {
        Self::InvalidRelativePath {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an outside-of-dataset error
    pub fn outside_dataset(path: &std::path::Path, dataset: &std::path::Path) -> Self {
        Self::OutsideDataset {
            path: path.to_path_buf(),
            dataset: dataset.to_path_buf(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }
}
