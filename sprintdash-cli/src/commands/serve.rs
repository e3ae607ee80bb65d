//! Serve command - run the dashboard HTTP API

use std::sync::Arc;

use clap::Args;
use sprintdash_core::{Config, Secrets};

use crate::server::{self, AppState, GitHubConnector};

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config and env)
    #[arg(short, long, env = "SPRINTDASH_BIND")]
    pub bind: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let fallback_token = Secrets::load()?.github_token();
        if fallback_token.is_none() {
            tracing::info!("No configured GitHub token; requests must carry their own");
        }

        let connector = Arc::new(GitHubConnector::new(config.github.clone()));
        let state = AppState::new(connector, config, fallback_token);

        println!("sprintdash API listening on http://{}", config.server.bind);
        server::serve(&config.server.bind, state).await
    }
}
