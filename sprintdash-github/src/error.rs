//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marker GitHub puts in primary rate-limit error messages
const RATE_LIMIT_MARKER: &str = "rate limit exceeded";

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub REST API error
    #[error("GitHub API error: {0}")]
    Api(octocrab::Error),

    /// Transport error talking to the GraphQL endpoint
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or rejected credentials
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Repository argument is not `owner/name`
    #[error("Invalid repository '{0}'. Expected owner/repo")]
    InvalidRepo(String),

    /// A project, field or other resource the request depends on is missing
    #[error("{0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    /// Pagination did not terminate within the configured bound
    #[error("Gave up listing {resource} after {max_pages} pages; raise {setting} to read further")]
    PageLimit {
        resource: &'static str,
        max_pages: u32,
        /// Config key holding the bound
        setting: &'static str,
    },

    /// GraphQL response carried errors
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Classify an upstream failure message
    ///
    /// Rate limiting and bad credentials get their own variants, everything
    /// else is returned by `fallback`.
    pub(crate) fn classify(message: &str, fallback: impl FnOnce() -> Error) -> Error {
        let lower = message.to_lowercase();
        if lower.contains(RATE_LIMIT_MARKER) {
            Error::RateLimited(message.to_string())
        } else if lower.contains("bad credentials") {
            Error::Auth("Invalid GitHub token".to_string())
        } else {
            fallback()
        }
    }

    /// Whether this error means the upstream quota is exhausted
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };
        Error::classify(&message, || Error::Api(err))
    }
}
