//! GitHub API client using octocrab for REST and reqwest for GraphQL

use std::fmt;
use std::str::FromStr;

use octocrab::Octocrab;
use serde::Serialize;
use sprintdash_core::GitHubConfig;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// A repository named as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Create a repository reference from its parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (owner, name) = parse_github_url(s.trim())?;
        Ok(Self { owner, name })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GitHub API client bound to one access token
///
/// A client is built per request from the caller's credential; it holds no
/// state beyond the connection pools of its HTTP clients.
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    token: String,
    graphql_url: Url,
}

impl GitHubClient {
    /// Create a client authenticated with `token` against the configured endpoints
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Auth("GitHub token is empty".to_string()));
        }

        let client = Octocrab::builder()
            .base_uri(config.api_url.as_str())
            .map_err(|e| Error::Parse(format!("Invalid GitHub API URL: {}", e)))?
            .personal_token(token.clone())
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        let graphql_url = Url::parse(&config.graphql_url)
            .map_err(|e| Error::Parse(format!("Invalid GraphQL URL: {}", e)))?;

        debug!(api_url = %config.api_url, graphql_url = %graphql_url, "Created GitHub client");

        Ok(Self {
            client,
            http,
            token,
            graphql_url,
        })
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("graphql_url", &self.graphql_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Parse a GitHub repository reference into owner and repo
///
/// Supports formats:
/// - owner/repo
/// - https://github.com/owner/repo
/// - git@github.com:owner/repo.git
fn parse_github_url(url: &str) -> Result<(String, String)> {
    let invalid = || Error::InvalidRepo(url.to_string());

    let path = if url.starts_with("https://") || url.starts_with("http://") {
        let parsed = Url::parse(url).map_err(|_| invalid())?;
        parsed.path().trim_matches('/').to_string()
    } else if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':').map(|(_, path)| path.to_string()).ok_or_else(invalid)?
    } else {
        url.to_string()
    };

    let path = path.trim_end_matches(".git");
    let mut parts = path.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            // Shorthand must be exactly owner/repo; URLs may carry extra segments
            if parts.next().is_some() && !url.contains("://") {
                return Err(invalid());
            }
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand() {
        let repo: RepoRef = "owner/repo".parse().unwrap();
        assert_eq!(repo, RepoRef::new("owner", "repo"));
        assert_eq!(repo.to_string(), "owner/repo");
    }

    #[test]
    fn test_parse_https_url() {
        let (owner, repo) = parse_github_url("https://github.com/owner/repo").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_https_url_with_extra_segments() {
        let (owner, repo) = parse_github_url("https://github.com/owner/repo/issues/3").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_github_url("git@github.com:owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["invalid", "owner/", "/repo", "a/b/c", ""] {
            let err = input.parse::<RepoRef>().unwrap_err();
            assert!(matches!(err, Error::InvalidRepo(_)), "{input} should be rejected");
        }
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = GitHubClient::new("  ", &GitHubConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
