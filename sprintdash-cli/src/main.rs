//! sprintdash CLI - Backlog and sprint dashboard for GitHub repositories
//!
//! Serves the dashboard HTTP API and offers the same reports on the command line.

mod commands;
mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sprintdash_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{BacklogArgs, ReposArgs, ServeArgs, SprintArgs};

/// sprintdash: backlog and sprint reports for GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "sprintdash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to read instead of the default location
    #[arg(long, global = true, env = "SPRINTDASH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Run the dashboard HTTP API
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// List repositories you contribute to
    Repos(ReposArgs),

    /// Show backlog statistics for a repository
    Backlog(BacklogArgs),

    /// Show the items of a sprint
    Sprint(SprintArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let bind = match &cli.command {
        Some(Commands::Serve(args)) => args.bind.clone(),
        _ => None,
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), bind)?;

    if cli.verbose {
        tracing::info!(
            bind = %config.server.bind,
            api_url = %config.github.api_url,
            max_pages = config.pagination.max_pages,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("sprintdash {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Repos(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Backlog(args)) => {
            args.execute(&config, cli.verbose).await?;
        }
        Some(Commands::Sprint(args)) => {
            args.execute(&config, cli.verbose).await?;
        }
        Some(Commands::Config) => print_config(&config, cli.config.as_deref())?,
        None => {
            println!("sprintdash - Backlog and sprint dashboard for GitHub repositories");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config, explicit: Option<&std::path::Path>) -> anyhow::Result<()> {
    println!("sprintdash Configuration");
    println!("========================");
    println!();
    println!("Server:");
    println!("  bind: {}", config.server.bind);
    println!();
    println!("GitHub:");
    println!("  api_url: {}", config.github.api_url);
    println!("  graphql_url: {}", config.github.graphql_url);
    println!("  user_agent: {}", config.github.user_agent);
    println!();
    println!("Pagination:");
    println!("  page_size: {}", config.pagination.page_size);
    println!("  max_pages: {}", config.pagination.max_pages);
    println!("  max_issue_pages: {}", config.pagination.max_issue_pages);
    println!();
    println!("Backlog:");
    println!("  window: {:?}", config.backlog.window);
    println!("  label: {}", config.backlog.label);
    println!();

    let path = explicit.map(PathBuf::from).or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }

    let token = Secrets::load()?.github_token();
    println!(
        "GitHub token: {}",
        if token.is_some() { "configured" } else { "not set" }
    );

    Ok(())
}
