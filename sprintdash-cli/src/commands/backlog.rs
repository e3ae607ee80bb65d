//! Backlog command - print backlog statistics for a repository

use clap::Args;
use sprintdash_core::{Config, ExportFormat};
use sprintdash_github::backlog::IssueBucket;

use super::OutputFormat;
use crate::server::api::{self, BacklogParams};

/// Arguments for the backlog command
#[derive(Args, Debug)]
pub struct BacklogArgs {
    /// Repository (owner/repo format)
    pub repo: String,

    /// Print a table or JSON instead of the issue summary
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl BacklogArgs {
    /// Execute the backlog command
    pub async fn execute(&self, config: &Config, verbose: bool) -> anyhow::Result<()> {
        let client = super::local_client(config)?;
        let params = BacklogParams {
            repo: Some(self.repo.clone()),
        };

        if verbose {
            eprintln!("Fetching issues from {}...", self.repo);
        }

        let stats = api::backlog_stats(
            &client,
            &params,
            config.pagination,
            &config.backlog,
            chrono::Utc::now(),
        )
        .await?;

        match self.format {
            Some(OutputFormat::Markdown) => println!("{}", stats.export(ExportFormat::Markdown)),
            Some(OutputFormat::Html) => println!("{}", stats.export(ExportFormat::Html)),
            Some(OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => {
                println!("Backlog for {} since {}", self.repo, stats.since.format("%Y-%m-%d"));
                println!();
                print_bucket("New PBIs", &stats.new);
                print_bucket(&format!("{} PBIs", stats.label), &stats.labeled);
                print_bucket("Completed PBIs", &stats.completed);
            }
        }

        Ok(())
    }
}

fn print_bucket(heading: &str, bucket: &IssueBucket) {
    println!("{} ({})", heading, bucket.count);
    for issue in &bucket.issues {
        println!("  #{:<6} {}", issue.number, issue.title);
    }
    println!();
}
