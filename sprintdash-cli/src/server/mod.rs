//! Dashboard HTTP API
//!
//! ```text
//! GET /repositories
//! GET /backlog-stats?repo=<owner/name>
//! GET /backlog-stats/export?repo=<owner/name>&format=markdown|html
//! GET /sprint-details?repo=<owner/name>&sprint=<n>[&project=<number>]
//! GET /sprint-details/export?repo=<owner/name>&sprint=<n>&format=markdown|html
//! ```
//!
//! Every request builds its own GitHub client from the request credential;
//! nothing is shared or cached between requests.

pub mod api;
pub mod error;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sprintdash_core::{BacklogConfig, Config, GitHubConfig, PaginationConfig};
use sprintdash_github::{BacklogStats, GitHubApi, GitHubClient, Repository, SprintDetails};
use tracing::info;

use api::{BacklogExportParams, BacklogParams, ExportBody, ExportParams, SprintParams};
pub use error::ApiError;

/// Builds a GitHub data source for one credential
pub trait Connector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Box<dyn GitHubApi>, ApiError>;
}

/// Connects to the configured GitHub endpoints
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    config: GitHubConfig,
}

impl GitHubConnector {
    pub fn new(config: GitHubConfig) -> Self {
        Self { config }
    }
}

impl Connector for GitHubConnector {
    fn connect(&self, token: &str) -> Result<Box<dyn GitHubApi>, ApiError> {
        Ok(Box::new(GitHubClient::new(token, &self.config)?))
    }
}

/// Shared, read-only server state
#[derive(Clone)]
pub struct AppState {
    connector: Arc<dyn Connector>,
    fallback_token: Option<String>,
    pagination: PaginationConfig,
    backlog: BacklogConfig,
}

impl AppState {
    pub fn new(connector: Arc<dyn Connector>, config: &Config, fallback_token: Option<String>) -> Self {
        Self {
            connector,
            fallback_token,
            pagination: config.pagination,
            backlog: config.backlog.clone(),
        }
    }

    fn connect(&self, headers: &HeaderMap) -> Result<Box<dyn GitHubApi>, ApiError> {
        let header = headers
            .get(AUTHORIZATION)
            .map(|value| {
                value.to_str().map_err(|_| {
                    ApiError::Unauthenticated("authorization header is not text".to_string())
                })
            })
            .transpose()?;

        let token = api::resolve_token(header, self.fallback_token.as_deref())?;
        self.connector.connect(&token)
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/repositories", get(repositories))
        .route("/backlog-stats", get(backlog_stats))
        .route("/backlog-stats/export", get(backlog_export))
        .route("/sprint-details", get(sprint_details))
        .route("/sprint-details/export", get(sprint_export))
        .with_state(state)
}

/// Serve the API until ctrl-c
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Dashboard API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn repositories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Repository>>, ApiError> {
    let github = state.connect(&headers)?;
    Ok(Json(api::repositories(github.as_ref()).await?))
}

async fn backlog_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BacklogParams>,
) -> Result<Json<BacklogStats>, ApiError> {
    let github = state.connect(&headers)?;
    let stats = api::backlog_stats(
        github.as_ref(),
        &params,
        state.pagination,
        &state.backlog,
        chrono::Utc::now(),
    )
    .await?;
    Ok(Json(stats))
}

async fn backlog_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BacklogExportParams>,
) -> Result<Response, ApiError> {
    let github = state.connect(&headers)?;
    let export = api::backlog_export(
        github.as_ref(),
        &params,
        state.pagination,
        &state.backlog,
        chrono::Utc::now(),
    )
    .await?;
    Ok(export_response(export))
}

async fn sprint_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SprintParams>,
) -> Result<Json<SprintDetails>, ApiError> {
    let github = state.connect(&headers)?;
    let details = api::sprint_details(github.as_ref(), &params, state.pagination).await?;
    Ok(Json(details))
}

async fn sprint_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let github = state.connect(&headers)?;
    let export = api::sprint_export(github.as_ref(), &params, state.pagination).await?;
    Ok(export_response(export))
}

fn export_response(export: ExportBody) -> Response {
    let content_type = format!("{}; charset=utf-8", export.content_type);
    ([(CONTENT_TYPE, content_type)], export.body).into_response()
}
