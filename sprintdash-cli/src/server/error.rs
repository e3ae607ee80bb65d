//! API errors and their HTTP translation

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to dashboard clients
///
/// Each variant maps to one HTTP status; the body is `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable credential
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Missing or malformed request parameter
    #[error("{0}")]
    InvalidArgument(String),

    /// Project, field, sprint or repository missing
    #[error("{0}")]
    NotFound(String),

    /// GitHub quota exhausted
    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimited(String),

    /// A listing hit its configured page bound
    #[error("{0}")]
    PageLimit(String),

    /// Any other upstream failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PageLimit(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthenticated(_) => "Not authenticated".to_string(),
            ApiError::InvalidArgument(msg)
            | ApiError::NotFound(msg)
            | ApiError::PageLimit(msg) => msg.clone(),
            ApiError::RateLimited(_) => {
                "GitHub API rate limit exceeded. Please try again later.".to_string()
            }
            ApiError::Internal(_) => "Failed to fetch data from GitHub".to_string(),
        }
    }
}

impl From<sprintdash_github::Error> for ApiError {
    fn from(err: sprintdash_github::Error) -> Self {
        use sprintdash_github::Error as GhError;

        match err {
            GhError::Auth(msg) => ApiError::Unauthenticated(msg),
            GhError::InvalidRepo(_) => ApiError::InvalidArgument(err.to_string()),
            GhError::NotFound(msg) => ApiError::NotFound(msg),
            GhError::RateLimited(msg) => ApiError::RateLimited(msg),
            GhError::PageLimit { .. } => ApiError::PageLimit(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintdash_github::Error as GhError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthenticated("x".into()), 401),
            (ApiError::InvalidArgument("x".into()), 400),
            (ApiError::NotFound("x".into()), 404),
            (ApiError::RateLimited("x".into()), 429),
            (ApiError::PageLimit("x".into()), 500),
            (ApiError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn test_from_github_error() {
        assert!(matches!(
            ApiError::from(GhError::Auth("bad".into())),
            ApiError::Unauthenticated(_)
        ));
        assert!(matches!(
            ApiError::from(GhError::InvalidRepo("nope".into())),
            ApiError::InvalidArgument(ref m) if m.contains("owner/repo")
        ));
        assert!(matches!(
            ApiError::from(GhError::NotFound("No active project found".into())),
            ApiError::NotFound(ref m) if m == "No active project found"
        ));
        assert!(matches!(
            ApiError::from(GhError::RateLimited("API rate limit exceeded".into())),
            ApiError::RateLimited(_)
        ));
        assert!(matches!(
            ApiError::from(GhError::PageLimit {
                resource: "issues",
                max_pages: 2,
                setting: "pagination.max_issue_pages",
            }),
            ApiError::PageLimit(ref m) if m.contains("pagination.max_issue_pages")
        ));
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = ApiError::Internal("token ghp_secret leaked in upstream message".into());
        assert_eq!(err.public_message(), "Failed to fetch data from GitHub");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::RateLimited("quota".into()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
