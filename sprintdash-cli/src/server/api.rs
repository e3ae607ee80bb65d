//! HTTP-agnostic request handlers
//!
//! Handlers take typed parameters and a GitHub data source and return
//! `Result<T, ApiError>`; the axum routes and the CLI commands both call them.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sprintdash_core::{BacklogConfig, ExportFormat, PaginationConfig};
use sprintdash_github::{
    backlog_stats as compute_backlog, list_repositories, resolve_sprint_items, BacklogStats,
    GitHubApi, RepoRef, Repository, SprintDetails, SprintQuery,
};

use super::error::ApiError;

/// Query of `GET /backlog-stats`
#[derive(Debug, Default, Deserialize)]
pub struct BacklogParams {
    pub repo: Option<String>,
}

/// Query of `GET /backlog-stats/export`
#[derive(Debug, Default, Deserialize)]
pub struct BacklogExportParams {
    pub repo: Option<String>,
    pub format: Option<String>,
}

/// Query of `GET /sprint-details`
#[derive(Debug, Default, Deserialize)]
pub struct SprintParams {
    pub repo: Option<String>,
    pub sprint: Option<String>,
    pub project: Option<String>,
}

/// Query of `GET /sprint-details/export`
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub repo: Option<String>,
    pub sprint: Option<String>,
    pub project: Option<String>,
    pub format: Option<String>,
}

/// A rendered export and the MIME type it belongs under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBody {
    pub content_type: &'static str,
    pub body: String,
}

/// Pick the request credential, falling back to the configured token
///
/// Accepts `Bearer <token>` and `token <token>` authorization values.
pub fn resolve_token(header: Option<&str>, fallback: Option<&str>) -> Result<String, ApiError> {
    if let Some(value) = header {
        let value = value.trim();
        let token = value
            .split_once(' ')
            .filter(|(scheme, _)| {
                scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token")
            })
            .map(|(_, token)| token.trim())
            .ok_or_else(|| {
                ApiError::Unauthenticated("unsupported authorization scheme".to_string())
            })?;

        if token.is_empty() {
            return Err(ApiError::Unauthenticated("empty access token".to_string()));
        }
        return Ok(token.to_string());
    }

    fallback
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthenticated("no access token".to_string()))
}

/// Parse the `format` parameter; Markdown when absent
pub fn parse_format(format: Option<&str>) -> Result<ExportFormat, ApiError> {
    match format.map(str::trim) {
        None | Some("") => Ok(ExportFormat::Markdown),
        Some(raw) => raw
            .parse()
            .map_err(|e: sprintdash_core::Error| ApiError::InvalidArgument(e.to_string())),
    }
}

/// Parse the `repo` parameter
pub fn parse_repo(repo: Option<&str>) -> Result<RepoRef, ApiError> {
    match repo.map(str::trim) {
        Some(repo) if !repo.is_empty() => Ok(repo.parse()?),
        _ => Err(ApiError::InvalidArgument(
            "Repository parameter is required".to_string(),
        )),
    }
}

impl SprintParams {
    /// Validate into a repository and sprint query
    pub fn parse(&self) -> Result<(RepoRef, SprintQuery), ApiError> {
        let repo = parse_repo(self.repo.as_deref())?;

        let sprint = match self.sprint.as_deref().map(str::trim) {
            Some(sprint) if !sprint.is_empty() => sprint.to_string(),
            _ => {
                return Err(ApiError::InvalidArgument(
                    "Sprint parameter is required".to_string(),
                ))
            }
        };

        let project_number = match self.project.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                ApiError::InvalidArgument(format!("Project must be a number, got '{}'", raw))
            })?),
        };

        Ok((
            repo,
            SprintQuery {
                sprint,
                project_number,
            },
        ))
    }
}

impl ExportParams {
    fn sprint_params(&self) -> SprintParams {
        SprintParams {
            repo: self.repo.clone(),
            sprint: self.sprint.clone(),
            project: self.project.clone(),
        }
    }
}

/// `GET /repositories`
pub async fn repositories(api: &dyn GitHubApi) -> Result<Vec<Repository>, ApiError> {
    Ok(list_repositories(api).await?)
}

/// `GET /backlog-stats`
pub async fn backlog_stats(
    api: &dyn GitHubApi,
    params: &BacklogParams,
    limits: PaginationConfig,
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> Result<BacklogStats, ApiError> {
    let repo = parse_repo(params.repo.as_deref())?;
    Ok(compute_backlog(api, &repo, limits, config, now).await?)
}

/// `GET /backlog-stats/export`
pub async fn backlog_export(
    api: &dyn GitHubApi,
    params: &BacklogExportParams,
    limits: PaginationConfig,
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> Result<ExportBody, ApiError> {
    let format = parse_format(params.format.as_deref())?;
    let stats = backlog_stats(
        api,
        &BacklogParams {
            repo: params.repo.clone(),
        },
        limits,
        config,
        now,
    )
    .await?;

    Ok(ExportBody {
        content_type: format.mime_type(),
        body: stats.export(format),
    })
}

/// `GET /sprint-details`; a sprint without items is reported as not found
pub async fn sprint_details(
    api: &dyn GitHubApi,
    params: &SprintParams,
    limits: PaginationConfig,
) -> Result<SprintDetails, ApiError> {
    let (repo, query) = params.parse()?;
    let details = resolve_sprint_items(api, &repo, &query, limits).await?;

    if details.items.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No items found for {} in project '{}'",
            details.sprint, details.project.title
        )));
    }

    Ok(details)
}

/// `GET /sprint-details/export`
pub async fn sprint_export(
    api: &dyn GitHubApi,
    params: &ExportParams,
    limits: PaginationConfig,
) -> Result<ExportBody, ApiError> {
    let format = parse_format(params.format.as_deref())?;
    let details = sprint_details(api, &params.sprint_params(), limits).await?;

    Ok(ExportBody {
        content_type: format.mime_type(),
        body: details.export(format),
    })
}
