use thiserror::Error;

/// Main error type for the group survey
#[derive(Error, Debug)]
pub enum GroupScanError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The MediaWiki API answered with an `error` object.
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Survey errors
    /// The sitematrix could not be fetched or had an unexpected shape.
    /// Fatal: nothing is probed and no artifact is written.
    #[error("Directory query failed: {0}")]
    Directory(String),

    /// A single wiki could not be probed. Never aborts the run.
    #[error("Probe failed for {member}: {reason}")]
    Probe { member: String, reason: String },

    // Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for GroupScanError
pub type Result<T> = std::result::Result<T, GroupScanError>;

impl GroupScanError {
    /// Whether this error must abort the whole survey.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GroupScanError::Probe { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_errors_are_local() {
        let err = GroupScanError::Probe {
            member: "enwiki".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Probe failed for enwiki: timeout");
    }

    #[test]
    fn directory_errors_are_fatal() {
        let err = GroupScanError::Directory("missing sitematrix".to_string());
        assert!(err.is_fatal());
        assert!(GroupScanError::Cancelled.is_fatal());
    }
}
