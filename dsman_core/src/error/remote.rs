//! Remote site related error types

use thiserror::Error;

/// Errors talking to a remote hosting site
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Site could not be reached
    #[error("Remote site unavailable: {message}")]
    Unavailable { message: String },

    /// Site answered with an error status
    #[error("Remote site error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Site configuration lacks what the client needs
    #[error("Remote site '{site}' is not configured: {message}")]
    NotConfigured { site: String, message: String },

    /// Generic remote error
    #[error("Remote error: {message}")]
    Other { message: String },
}

impl RemoteError {
    /// Create a server error with status and message
    pub fn server_error(status: u16, message: &str) -> Self {
        Self::ServerError {
            status,
            message: message.to_string(),
        }
    }

    /// Create a not configured error
    pub fn not_configured(site: &str, message: &str) -> Self {
        Self::NotConfigured {
            site: site.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a generic remote error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error is transient and can be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::ServerError { status, .. } => matches!(status, 500..=504),
            Self::NotConfigured { .. } | Self::Other { .. } => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unavailable {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::server_error(status.as_u16(), &err.to_string())
        } else {
            Self::other(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error() {
        let error = RemoteError::server_error(502, "Bad gateway");
        assert!(error.to_string().contains("502"));
        assert!(error.is_transient());
    }

    #[test]
    fn test_client_error_is_not_transient() {
        let error = RemoteError::server_error(403, "Forbidden");
        assert!(!error.is_transient());
    }

    #[test]
    fn test_not_configured_error() {
        let error = RemoteError::not_configured("theone", "no url");
        assert!(error.to_string().contains("'theone'"));
        assert!(!error.is_transient());
    }
}
