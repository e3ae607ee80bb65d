//! Configuration management for sprintdash
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (SPRINTDASH_*)
//! 3. Config file (~/.config/sprintdash/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// GitHub caps REST `per_page` and GraphQL `first` at 100
const MAX_PAGE_SIZE: u8 = 100;

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the dashboard API listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// GitHub endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    pub api_url: String,

    /// GraphQL endpoint
    pub graphql_url: String,

    /// User-Agent sent with GraphQL requests
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            user_agent: "sprintdash".to_string(),
        }
    }
}

/// Pagination limits shared by every paged GitHub walk
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationConfig {
    /// Entries requested per page
    pub page_size: u8,

    /// Upper bound on project item pages fetched for a single request
    pub max_pages: u32,

    /// Upper bound on issue pages fetched for a single request
    ///
    /// The issue listing includes pull requests, so busy repositories need
    /// far more pages than a project board.
    pub max_issue_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_pages: 50,
            max_issue_pages: 1000,
        }
    }
}

/// Backlog statistics configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BacklogConfig {
    /// Trailing window the statistics cover
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Label counted separately in the statistics
    pub label: String,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30 * 24 * 60 * 60),
            label: "YakShaver".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// GitHub endpoints
    pub github: GitHubConfig,

    /// Pagination limits
    pub pagination: PaginationConfig,

    /// Backlog statistics
    pub backlog: BacklogConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/sprintdash/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sprintdash").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - SPRINTDASH_BIND: server listen address
    /// - SPRINTDASH_GITHUB_API_URL: REST API base URL
    /// - SPRINTDASH_GITHUB_GRAPHQL_URL: GraphQL endpoint
    /// - SPRINTDASH_MAX_PAGES: project item pagination bound
    /// - SPRINTDASH_MAX_ISSUE_PAGES: issue pagination bound
    /// - SPRINTDASH_BACKLOG_LABEL: label counted in backlog statistics
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bind) = std::env::var("SPRINTDASH_BIND") {
            self.server.bind = bind;
        }

        if let Ok(url) = std::env::var("SPRINTDASH_GITHUB_API_URL") {
            self.github.api_url = url;
        }

        if let Ok(url) = std::env::var("SPRINTDASH_GITHUB_GRAPHQL_URL") {
            self.github.graphql_url = url;
        }

        if let Ok(raw) = std::env::var("SPRINTDASH_MAX_PAGES") {
            match raw.parse() {
                Ok(max_pages) => self.pagination.max_pages = max_pages,
                Err(_) => warn!(value = %raw, "Ignoring invalid SPRINTDASH_MAX_PAGES"),
            }
        }

        if let Ok(raw) = std::env::var("SPRINTDASH_MAX_ISSUE_PAGES") {
            match raw.parse() {
                Ok(max_pages) => self.pagination.max_issue_pages = max_pages,
                Err(_) => warn!(value = %raw, "Ignoring invalid SPRINTDASH_MAX_ISSUE_PAGES"),
            }
        }

        if let Ok(label) = std::env::var("SPRINTDASH_BACKLOG_LABEL") {
            self.backlog.label = label;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, bind: Option<String>) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }

        self
    }

    /// Check values that would otherwise fail deep inside a request
    pub fn validate(&self) -> Result<()> {
        let page_size = self.pagination.page_size;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "pagination.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        for (key, value) in [
            ("pagination.max_pages", self.pagination.max_pages),
            ("pagination.max_issue_pages", self.pagination.max_issue_pages),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be at least 1", key)));
            }
        }

        for (key, value) in [
            ("github.api_url", &self.github.api_url),
            ("github.graphql_url", &self.github.graphql_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{} '{}' is not a URL: {}", key, value, e)))?;
        }

        Ok(())
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults. An explicit `path`
    /// replaces the default config file location.
    pub fn load_with_overrides(path: Option<&Path>, bind: Option<String>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        let config = base.with_env_overrides().with_cli_overrides(bind);
        config.validate()?;
        Ok(config)
    }
}
