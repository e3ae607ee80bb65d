//! GitHub GraphQL API support for Projects (v2) and contribution queries

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{Error, GitHubClient, Result};

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Generic `{ nodes: [...] }` connection; GitHub may return null nodes
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Connection<T> {
    #[serde(default)]
    nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    pub(crate) fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten()
    }
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// Turn the `errors` array of a response into a single error
fn errors_to_error(errors: Vec<GraphQLError>) -> Error {
    let messages = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if errors.iter().any(|e| e.kind.as_deref() == Some("RATE_LIMITED")) {
        return Error::RateLimited(messages);
    }
    if errors.iter().any(|e| e.kind.as_deref() == Some("NOT_FOUND")) {
        return Error::NotFound(messages);
    }

    Error::classify(&messages, || Error::GraphQL(messages.clone()))
}

impl GitHubClient {
    /// Execute a GraphQL query
    pub(crate) async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T> {
        debug!(url = %self.graphql_url(), "Executing GraphQL query");

        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http()
            .post(self.graphql_url().clone())
            .bearer_auth(self.token())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::Auth(format!("GitHub rejected the token: {}", text)));
            }
            return Err(Error::classify(&text, || {
                Error::GraphQL(format!("request failed with status {}: {}", status, text))
            }));
        }

        let graphql_response: GraphQLResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

        parse_response(graphql_response)
    }
}

fn parse_response<T>(response: GraphQLResponse<T>) -> Result<T> {
    if let Some(errors) = response.errors {
        if !errors.is_empty() {
            return Err(errors_to_error(errors));
        }
    }

    response
        .data
        .ok_or_else(|| Error::GraphQL("response missing data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Viewer {
        login: String,
    }

    fn decode(value: serde_json::Value) -> Result<Viewer> {
        let response: GraphQLResponse<Viewer> = serde_json::from_value(value).unwrap();
        parse_response(response)
    }

    #[test]
    fn test_data_is_returned() {
        let viewer = decode(json!({ "data": { "login": "octocat" } })).unwrap();
        assert_eq!(viewer.login, "octocat");
    }

    #[test]
    fn test_rate_limited_by_type() {
        let err = decode(json!({
            "errors": [{ "type": "RATE_LIMITED", "message": "API rate limit exceeded for user ID 1." }]
        }))
        .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_rate_limited_by_message() {
        let err = decode(json!({
            "data": null,
            "errors": [{ "message": "API rate limit exceeded" }]
        }))
        .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_not_found_type() {
        let err = decode(json!({
            "data": { "login": "ignored" },
            "errors": [{
                "type": "NOT_FOUND",
                "path": ["repository"],
                "message": "Could not resolve to a Repository with the name 'org/missing'."
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("org/missing")));
    }

    #[test]
    fn test_other_errors_are_joined() {
        let err = decode(json!({
            "errors": [{ "message": "first" }, { "message": "second" }]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: first, second");
    }

    #[test]
    fn test_missing_data() {
        let err = decode(json!({})).unwrap_err();
        assert!(matches!(err, Error::GraphQL(_)));
    }

    #[test]
    fn test_connection_skips_null_nodes() {
        let connection: Connection<u32> =
            serde_json::from_value(json!({ "nodes": [1, null, 3] })).unwrap();
        assert_eq!(connection.into_nodes().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_connection_of_non_default_nodes() {
        let connection: Connection<Viewer> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(connection.into_nodes().count(), 0);

        let connection: Connection<Viewer> =
            serde_json::from_value(json!({ "nodes": [{ "login": "octocat" }, null] })).unwrap();
        let logins: Vec<String> = connection.into_nodes().map(|v| v.login).collect();
        assert_eq!(logins, vec!["octocat"]);
    }
}
