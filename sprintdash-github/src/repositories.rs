//! Repositories the authenticated user contributes to

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::graphql::Connection;
use crate::{Error, GitHubClient, Result};

/// Repositories requested from the contribution listing
const CONTRIBUTED_REPOS: u8 = 100;

const CONTRIBUTIONS_QUERY: &str = r#"
    query($username: String!, $first: Int!) {
        user(login: $username) {
            repositoriesContributedTo(
                first: $first,
                contributionTypes: [COMMIT, PULL_REQUEST],
                orderBy: { field: UPDATED_AT, direction: DESC }
            ) {
                nodes {
                    id
                    name
                    nameWithOwner
                    description
                    url
                    updatedAt
                    stargazerCount
                    primaryLanguage {
                        name
                    }
                }
            }
        }
    }
"#;

/// A repository offered for selection in the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct Repository {
    /// GraphQL node id
    pub id: String,
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub updated_at: DateTime<Utc>,
    pub stargazers_count: u64,
    pub language: Option<String>,
}

/// A source of the current user's repositories
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Login of the user the credential belongs to
    async fn authenticated_login(&self) -> Result<String>;

    /// Repositories `login` contributed commits or pull requests to, most recently updated first
    async fn contributed_repositories(&self, login: &str, first: u8) -> Result<Vec<Repository>>;
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn authenticated_login(&self) -> Result<String> {
        let user = self.client().current().user().await?;
        Ok(user.login)
    }

    async fn contributed_repositories(&self, login: &str, first: u8) -> Result<Vec<Repository>> {
        debug!(login, "Fetching contributed repositories via GraphQL");

        let variables = json!({
            "username": login,
            "first": first,
        });
        let data: ContributionsData = self.graphql_query(CONTRIBUTIONS_QUERY, &variables).await?;
        data.into_repositories(login)
    }
}

/// List the repositories the credential's user works on
pub async fn list_repositories<S: RepositorySource + ?Sized>(source: &S) -> Result<Vec<Repository>> {
    let login = source.authenticated_login().await?;
    let repositories = source
        .contributed_repositories(&login, CONTRIBUTED_REPOS)
        .await?;

    info!(login = %login, count = repositories.len(), "Listed repositories");

    Ok(repositories)
}

#[derive(Debug, Deserialize)]
struct ContributionsData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    repositories_contributed_to: Connection<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    id: String,
    name: String,
    name_with_owner: String,
    description: Option<String>,
    url: String,
    updated_at: DateTime<Utc>,
    stargazer_count: u64,
    primary_language: Option<LanguageNode>,
}

#[derive(Debug, Deserialize)]
struct LanguageNode {
    name: String,
}

impl ContributionsData {
    fn into_repositories(self, login: &str) -> Result<Vec<Repository>> {
        let user = self
            .user
            .ok_or_else(|| Error::NotFound(format!("User {} not found", login)))?;

        Ok(user
            .repositories_contributed_to
            .into_nodes()
            .map(|node| Repository {
                id: node.id,
                name: node.name,
                full_name: node.name_with_owner,
                description: node.description,
                html_url: node.url,
                updated_at: node.updated_at,
                stargazers_count: node.stargazer_count,
                language: node.primary_language.map(|l| l.name),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_decode_contributions() {
        let data: ContributionsData = serde_json::from_value(json!({
            "user": {
                "repositoriesContributedTo": {
                    "nodes": [
                        {
                            "id": "R_kgDO1",
                            "name": "dashboard",
                            "nameWithOwner": "org/dashboard",
                            "description": null,
                            "url": "https://github.com/org/dashboard",
                            "updatedAt": "2024-06-01T10:00:00Z",
                            "stargazerCount": 4,
                            "primaryLanguage": { "name": "Rust" }
                        },
                        {
                            "id": "R_kgDO2",
                            "name": "docs",
                            "nameWithOwner": "org/docs",
                            "description": "Docs site",
                            "url": "https://github.com/org/docs",
                            "updatedAt": "2024-05-01T10:00:00Z",
                            "stargazerCount": 0,
                            "primaryLanguage": null
                        }
                    ]
                }
            }
        }))
        .unwrap();

        let repos = data.into_repositories("octocat").unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].full_name, "org/dashboard");
        assert_eq!(repos[0].language.as_deref(), Some("Rust"));
        assert!(repos[0].description.is_none());
        assert_eq!(repos[1].language, None);
    }

    #[test]
    fn test_missing_user() {
        let data: ContributionsData = serde_json::from_value(json!({ "user": null })).unwrap();
        assert!(matches!(
            data.into_repositories("ghost"),
            Err(Error::NotFound(_))
        ));
    }

    struct FakeUser {
        asked_for: Mutex<Option<String>>,
    }

    #[async_trait]
    impl RepositorySource for FakeUser {
        async fn authenticated_login(&self) -> Result<String> {
            Ok("octocat".to_string())
        }

        async fn contributed_repositories(&self, login: &str, first: u8) -> Result<Vec<Repository>> {
            *self.asked_for.lock().unwrap() = Some(format!("{}:{}", login, first));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_list_uses_authenticated_login() {
        let source = FakeUser {
            asked_for: Mutex::new(None),
        };

        let repos = list_repositories(&source).await.unwrap();

        assert!(repos.is_empty());
        assert_eq!(
            source.asked_for.lock().unwrap().as_deref(),
            Some("octocat:100")
        );
    }
}
