//! Sprint command - print the items of a sprint as a table

use clap::Args;
use sprintdash_core::{Config, ExportFormat};

use super::OutputFormat;
use crate::server::api::{self, SprintParams};

/// Arguments for the sprint command
#[derive(Args, Debug)]
pub struct SprintArgs {
    /// Repository (owner/repo format)
    pub repo: String,

    /// Sprint number, matched against iteration titles "Sprint <n>"
    pub sprint: String,

    /// Project number to read instead of the first open project
    #[arg(short, long)]
    pub project: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,
}

impl SprintArgs {
    /// Execute the sprint command
    pub async fn execute(&self, config: &Config, verbose: bool) -> anyhow::Result<()> {
        let client = super::local_client(config)?;
        let params = SprintParams {
            repo: Some(self.repo.clone()),
            sprint: Some(self.sprint.clone()),
            project: self.project.map(|n| n.to_string()),
        };

        let details = api::sprint_details(&client, &params, config.pagination).await?;

        if verbose {
            eprintln!(
                "Project '{}' (#{}), field '{}', {} item(s) over {} page(s)",
                details.project.title,
                details.project.number,
                details.field.name,
                details.items.len(),
                details.pages_fetched
            );
        }

        match self.format {
            OutputFormat::Markdown => println!("{}", details.export(ExportFormat::Markdown)),
            OutputFormat::Html => println!("{}", details.export(ExportFormat::Html)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&details)?),
        }

        Ok(())
    }
}
