//! I/O related error types

use std::path::PathBuf;
use thiserror::Error;

/// I/O error with additional context
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Free-form detail (if any)
    pub detail: Option<String>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// Path not found
    NotFound,
    /// Permission denied
    PermissionDenied,
    /// Path exists but is not a dataset
    NotADataset,
    /// Stored data could not be parsed
    CorruptData,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a path not found error
    pub fn path_not_found(path: &std::path::Path) -> Self {
        Self {
            kind: IoErrorKind::NotFound,
            path: Some(path.to_path_buf()),
            detail: None,
            source: None,
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: &std::path::Path, source: std::io::Error) -> Self {
        Self {
            kind: IoErrorKind::PermissionDenied,
            path: Some(path.to_path_buf()),
            detail: None,
            source: Some(source),
        }
    }

    /// Create an error for a directory that carries no dataset
    pub fn not_a_dataset(path: &std::path::Path) -> Self {
        Self {
            kind: IoErrorKind::NotADataset,
            path: Some(path.to_path_buf()),
            detail: None,
            source: None,
        }
    }

    /// Create an error for unparseable stored data
    pub fn corrupt_data(detail: &str) -> Self {
        Self {
            kind: IoErrorKind::CorruptData,
            path: None,
            detail: Some(detail.to_string()),
            source: None,
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            detail: None,
            source: Some(source),
        }
    }

    /// Create an I/O error with a path
    pub fn with_path(mut self, path: &std::path::Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::NotFound, Some(path)) => format!("Path not found: {}", path.display()),
        (IoErrorKind::NotFound, None) => "Path not found".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied for path: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::NotADataset, Some(path)) => {
            format!("No dataset found at: {}", path.display())
        }
        (IoErrorKind::NotADataset, None) => "No dataset found".to_string(),
        (IoErrorKind::CorruptData, _) => match &error.detail {
            Some(detail) => format!("Corrupt data: {detail}"),
            None => "Corrupt data".to_string(),
        },
        (IoErrorKind::Other, _) => {
            if let Some(source) = &error.source {
                format!("I/O error: {source}")
            } else {
                "I/O error".to_string()
            }
        }
    }
}
