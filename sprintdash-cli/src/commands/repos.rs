//! Repos command - list repositories the token's user contributes to

use clap::Args;
use sprintdash_core::Config;

use crate::server::api;

/// Arguments for the repos command
#[derive(Args, Debug)]
pub struct ReposArgs {
    /// Print JSON instead of a list
    #[arg(long)]
    pub json: bool,
}

impl ReposArgs {
    /// Execute the repos command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = super::local_client(config)?;
        let repos = api::repositories(&client).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&repos)?);
            return Ok(());
        }

        if repos.is_empty() {
            println!("No repositories found.");
            return Ok(());
        }

        for repo in &repos {
            println!(
                "{:<40} {:<12} updated {}",
                repo.full_name,
                repo.language.as_deref().unwrap_or("-"),
                repo.updated_at.format("%Y-%m-%d")
            );
        }

        Ok(())
    }
}
