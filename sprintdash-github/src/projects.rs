//! GitHub Projects (v2) boards, fields and items

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::graphql::Connection;
use crate::{Error, GitHubClient, RepoRef, Result};

/// Projects requested per repository
const PROJECTS_PER_REPO: u8 = 100;

const PROJECTS_QUERY: &str = r#"
    query($owner: String!, $name: String!, $first: Int!) {
        repository(owner: $owner, name: $name) {
            projectsV2(first: $first) {
                nodes {
                    id
                    title
                    number
                    closed
                    fields(first: 20) {
                        nodes {
                            __typename
                            ... on ProjectV2Field {
                                id
                                name
                            }
                            ... on ProjectV2SingleSelectField {
                                id
                                name
                                options {
                                    id
                                    name
                                }
                            }
                            ... on ProjectV2IterationField {
                                id
                                name
                                configuration {
                                    iterations {
                                        id
                                        title
                                        startDate
                                        duration
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

const ITEMS_QUERY: &str = r#"
    query($projectId: ID!, $first: Int!, $after: String) {
        node(id: $projectId) {
            ... on ProjectV2 {
                items(first: $first, after: $after) {
                    pageInfo {
                        hasNextPage
                        endCursor
                    }
                    nodes {
                        id
                        fieldValues(first: 20) {
                            nodes {
                                __typename
                                ... on ProjectV2ItemFieldTextValue {
                                    field { ... on ProjectV2Field { id name } }
                                    text
                                }
                                ... on ProjectV2ItemFieldSingleSelectValue {
                                    field { ... on ProjectV2SingleSelectField { id name } }
                                    name
                                }
                                ... on ProjectV2ItemFieldIterationValue {
                                    field { ... on ProjectV2IterationField { id name } }
                                    title
                                }
                                ... on ProjectV2ItemFieldNumberValue {
                                    field { ... on ProjectV2Field { id name } }
                                    number
                                }
                                ... on ProjectV2ItemFieldDateValue {
                                    field { ... on ProjectV2Field { id name } }
                                    date
                                }
                            }
                        }
                        content {
                            __typename
                            ... on Issue {
                                id
                                number
                                title
                                url
                                assignees(first: 1) {
                                    nodes {
                                        login
                                        avatarUrl
                                    }
                                }
                                labels(first: 5) {
                                    nodes {
                                        name
                                        color
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

/// A Projects (v2) board
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub number: u64,
    pub closed: bool,
    pub fields: Vec<Field>,
}

/// A field defined on a project
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub kind: FieldKind,
}

/// What kind of values a field holds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Text, number or date field
    Plain,
    /// Field with a fixed set of options
    SingleSelect { options: Vec<String> },
    /// Iteration (sprint) field
    Iteration { iterations: Vec<Iteration> },
}

/// A configured iteration of an iteration field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub id: String,
    pub title: String,
    pub start_date: String,
    /// Length in days
    pub duration: u32,
}

/// An item on a project board
#[derive(Debug, Clone, Serialize)]
pub struct ProjectItem {
    pub id: String,
    /// The linked issue; `None` for draft issues and pull requests
    pub content: Option<IssueRef>,
    pub field_values: Vec<FieldValue>,
}

/// The issue behind a project item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRef {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(default, deserialize_with = "nodes")]
    pub assignees: Vec<Assignee>,
    #[serde(default, deserialize_with = "nodes")]
    pub labels: Vec<ItemLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLabel {
    pub name: String,
    pub color: String,
}

/// The value an item holds for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub field_id: Option<String>,
    pub field_name: Option<String>,
    pub value: Value,
}

/// Field value payload; iteration values carry the iteration title
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    SingleSelect(String),
    Iteration(String),
    Number(f64),
    Date(String),
    Empty,
}

impl FieldValue {
    /// Iteration title, if this is an iteration value
    pub fn iteration_title(&self) -> Option<&str> {
        match &self.value {
            Value::Iteration(title) => Some(title),
            _ => None,
        }
    }

    /// Human-readable form: text, then option name, then number, then date
    pub fn display(&self) -> Option<String> {
        match &self.value {
            Value::Text(s) | Value::SingleSelect(s) | Value::Iteration(s) | Value::Date(s)
                if !s.is_empty() =>
            {
                Some(s.clone())
            }
            Value::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl ProjectItem {
    /// Value for the field with this id
    pub fn value_for_field(&self, field_id: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|v| v.field_id.as_deref() == Some(field_id))
    }

    /// Value for the first field with this name
    pub fn value_named(&self, field_name: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|v| v.field_name.as_deref() == Some(field_name))
    }
}

/// One page of project items
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<ProjectItem>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A source of projects and their items
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Projects of a repository with their fields, in API order
    async fn projects(&self, repo: &RepoRef) -> Result<Vec<Project>>;

    /// One page of a project's items starting after `after`
    async fn item_page(&self, project_id: &str, after: Option<&str>, first: u8) -> Result<ItemPage>;
}

#[async_trait]
impl ProjectSource for GitHubClient {
    async fn projects(&self, repo: &RepoRef) -> Result<Vec<Project>> {
        debug!(%repo, "Fetching projects via GraphQL");

        let variables = json!({
            "owner": repo.owner,
            "name": repo.name,
            "first": PROJECTS_PER_REPO,
        });
        let data: ProjectsData = self.graphql_query(PROJECTS_QUERY, &variables).await?;
        data.into_projects(repo)
    }

    async fn item_page(&self, project_id: &str, after: Option<&str>, first: u8) -> Result<ItemPage> {
        debug!(project_id, ?after, "Fetching project items via GraphQL");

        let variables = json!({
            "projectId": project_id,
            "first": first,
            "after": after,
        });
        let data: ItemsData = self.graphql_query(ITEMS_QUERY, &variables).await?;
        data.into_page(project_id)
    }
}

fn nodes<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    let connection = Option::<Connection<T>>::deserialize(deserializer)?;
    Ok(connection.map(|c| c.into_nodes().collect()).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct ProjectsData {
    repository: Option<RepositoryProjects>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryProjects {
    projects_v2: Connection<ProjectNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    id: String,
    title: String,
    number: u64,
    closed: bool,
    #[serde(default)]
    fields: Connection<FieldNode>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum FieldNode {
    ProjectV2Field {
        id: String,
        name: String,
    },
    ProjectV2SingleSelectField {
        id: String,
        name: String,
        #[serde(default)]
        options: Vec<SelectOptionNode>,
    },
    ProjectV2IterationField {
        id: String,
        name: String,
        configuration: Option<IterationConfigurationNode>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct SelectOptionNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IterationConfigurationNode {
    #[serde(default)]
    iterations: Vec<Iteration>,
}

impl FieldNode {
    fn into_field(self) -> Option<Field> {
        match self {
            FieldNode::ProjectV2Field { id, name } => Some(Field {
                id,
                name,
                kind: FieldKind::Plain,
            }),
            FieldNode::ProjectV2SingleSelectField { id, name, options } => Some(Field {
                id,
                name,
                kind: FieldKind::SingleSelect {
                    options: options.into_iter().map(|o| o.name).collect(),
                },
            }),
            FieldNode::ProjectV2IterationField {
                id,
                name,
                configuration,
            } => Some(Field {
                id,
                name,
                kind: FieldKind::Iteration {
                    iterations: configuration.map(|c| c.iterations).unwrap_or_default(),
                },
            }),
            FieldNode::Unsupported => None,
        }
    }
}

impl ProjectsData {
    fn into_projects(self, repo: &RepoRef) -> Result<Vec<Project>> {
        let repository = self
            .repository
            .ok_or_else(|| Error::NotFound(format!("Repository {} not found", repo)))?;

        Ok(repository
            .projects_v2
            .into_nodes()
            .map(|node| Project {
                id: node.id,
                title: node.title,
                number: node.number,
                closed: node.closed,
                fields: node
                    .fields
                    .into_nodes()
                    .filter_map(FieldNode::into_field)
                    .collect(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ItemsData {
    node: Option<ProjectItemsNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectItemsNode {
    items: Option<ItemConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<ItemNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemNode {
    id: String,
    #[serde(default)]
    field_values: Connection<FieldValueNode>,
    content: Option<ContentNode>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldRefNode {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum FieldValueNode {
    ProjectV2ItemFieldTextValue {
        #[serde(default)]
        field: Option<FieldRefNode>,
        text: Option<String>,
    },
    ProjectV2ItemFieldSingleSelectValue {
        #[serde(default)]
        field: Option<FieldRefNode>,
        name: Option<String>,
    },
    ProjectV2ItemFieldIterationValue {
        #[serde(default)]
        field: Option<FieldRefNode>,
        title: Option<String>,
    },
    ProjectV2ItemFieldNumberValue {
        #[serde(default)]
        field: Option<FieldRefNode>,
        number: Option<f64>,
    },
    ProjectV2ItemFieldDateValue {
        #[serde(default)]
        field: Option<FieldRefNode>,
        date: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl FieldValueNode {
    fn into_value(self) -> Option<FieldValue> {
        let (field, value) = match self {
            FieldValueNode::ProjectV2ItemFieldTextValue { field, text } => {
                (field, text.map_or(Value::Empty, Value::Text))
            }
            FieldValueNode::ProjectV2ItemFieldSingleSelectValue { field, name } => {
                (field, name.map_or(Value::Empty, Value::SingleSelect))
            }
            FieldValueNode::ProjectV2ItemFieldIterationValue { field, title } => {
                (field, title.map_or(Value::Empty, Value::Iteration))
            }
            FieldValueNode::ProjectV2ItemFieldNumberValue { field, number } => {
                (field, number.map_or(Value::Empty, Value::Number))
            }
            FieldValueNode::ProjectV2ItemFieldDateValue { field, date } => {
                (field, date.map_or(Value::Empty, Value::Date))
            }
            FieldValueNode::Unsupported => return None,
        };

        let field = field.unwrap_or_default();
        Some(FieldValue {
            field_id: field.id,
            field_name: field.name,
            value,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum ContentNode {
    Issue(IssueRef),
    #[serde(other)]
    Other,
}

impl ItemsData {
    fn into_page(self, project_id: &str) -> Result<ItemPage> {
        let connection = self
            .node
            .and_then(|node| node.items)
            .ok_or_else(|| Error::NotFound(format!("Project {} not found", project_id)))?;

        let items = connection
            .nodes
            .into_iter()
            .flatten()
            .map(|node| ProjectItem {
                id: node.id,
                content: match node.content {
                    Some(ContentNode::Issue(issue)) => Some(issue),
                    _ => None,
                },
                field_values: node
                    .field_values
                    .into_nodes()
                    .filter_map(FieldValueNode::into_value)
                    .collect(),
            })
            .collect();

        Ok(ItemPage {
            items,
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        })
    }
}
