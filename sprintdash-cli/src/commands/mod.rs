//! CLI command implementations

pub mod backlog;
pub mod repos;
pub mod serve;
pub mod sprint;

pub use backlog::BacklogArgs;
pub use repos::ReposArgs;
pub use serve::ServeArgs;
pub use sprint::SprintArgs;

use clap::ValueEnum;
use sprintdash_core::{Config, Secrets};
use sprintdash_github::GitHubClient;

use crate::server::api;

/// Output format of report commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Html,
    Json,
}

/// Build a client from the locally configured token
fn local_client(config: &Config) -> anyhow::Result<GitHubClient> {
    let fallback = Secrets::load()?.github_token();
    let token = api::resolve_token(None, fallback.as_deref()).map_err(|_| {
        anyhow::anyhow!(
            "GitHub token not found. Set GITHUB_TOKEN or add a token to {}",
            Secrets::default_secrets_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the sprintdash secrets file".to_string())
        )
    })?;

    Ok(GitHubClient::new(token, &config.github)?)
}
