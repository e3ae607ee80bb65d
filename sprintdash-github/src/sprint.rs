//! Sprint item resolution on a project board
//!
//! Resolution walks `Start -> ProjectsFetched -> FieldSelected -> ItemsPaging
//! -> Done`; any step can fail and aborts the whole request.
//!
//! 1. fetch the repository's projects with their fields
//! 2. pick the active project: the requested number, else the first one
//!    that is not closed
//! 3. pick the first field whose name mentions "sprint" or "iteration"
//! 4. page through the project's items, keeping those whose value for that
//!    field is titled exactly `Sprint <n>`

use serde::Serialize;
use sprintdash_core::export::{self, Cell, ExportFormat};
use sprintdash_core::PaginationConfig;
use tracing::{debug, info, warn};

use crate::projects::{Field, Project, ProjectItem, ProjectSource};
use crate::{Error, RepoRef, Result};

/// Column headers of the sprint export table
pub const SPRINT_TABLE_HEADERS: [&str; 5] = ["ID", "Title", "Assignee", "Status", "Estimate"];

const NOT_SET: &str = "Not set";

/// Which sprint to resolve
#[derive(Debug, Clone)]
pub struct SprintQuery {
    /// Sprint number as typed by the user, e.g. `"3"`
    pub sprint: String,
    /// Project number to use instead of the first open project
    pub project_number: Option<u64>,
}

impl SprintQuery {
    pub fn new(sprint: impl Into<String>) -> Self {
        Self {
            sprint: sprint.into(),
            project_number: None,
        }
    }

    /// Iteration title items of this sprint carry
    pub fn label(&self) -> String {
        format!("Sprint {}", self.sprint)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub number: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub id: String,
    pub name: String,
}

/// Items of one sprint plus how they were found
#[derive(Debug, Clone, Serialize)]
pub struct SprintDetails {
    pub project: ProjectSummary,
    pub field: FieldSummary,
    /// Iteration title that was matched
    pub sprint: String,
    pub items: Vec<ProjectItem>,
    pub pages_fetched: u32,
    /// Every sprint-like field name of the project, selected one first
    pub candidate_fields: Vec<String>,
}

impl SprintDetails {
    /// Export rows in [`SPRINT_TABLE_HEADERS`] order
    pub fn table_rows(&self) -> Vec<Vec<Cell>> {
        self.items.iter().map(table_row).collect()
    }

    /// Render the items as a table in `format`
    pub fn export(&self, format: ExportFormat) -> String {
        export::render_cells(&SPRINT_TABLE_HEADERS, &self.table_rows(), format)
    }
}

fn table_row(item: &ProjectItem) -> Vec<Cell> {
    let field_text = |name: &str| {
        item.value_named(name)
            .and_then(|v| v.display())
            .unwrap_or_else(|| NOT_SET.to_string())
    };

    let (id, title, assignee) = match &item.content {
        Some(issue) => (
            Cell::link(format!("#{}", issue.number), issue.url.clone()),
            issue.title.clone(),
            issue
                .assignees
                .first()
                .map(|a| a.login.clone())
                .unwrap_or_else(|| "Unassigned".to_string()),
        ),
        None => (
            Cell::from(""),
            "(no linked issue)".to_string(),
            "Unassigned".to_string(),
        ),
    };

    vec![
        id,
        Cell::from(title),
        Cell::from(assignee),
        Cell::from(field_text("Status")),
        Cell::from(field_text("Estimate")),
    ]
}

/// Whether a field name looks like a sprint field
pub fn is_sprint_field_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("sprint") || name.contains("iteration")
}

/// Pick the project to read sprints from
///
/// With an explicit number that project is used, closed or not. Otherwise the
/// first project that is not closed wins, in API order.
pub fn select_project(projects: &[Project], number: Option<u64>) -> Result<&Project> {
    if let Some(number) = number {
        return projects
            .iter()
            .find(|p| p.number == number)
            .ok_or_else(|| Error::NotFound(format!("Project #{} not found", number)));
    }

    let mut open = projects.iter().filter(|p| !p.closed);
    let selected = open
        .next()
        .ok_or_else(|| Error::NotFound("No active project found".to_string()))?;

    let others: Vec<u64> = open.map(|p| p.number).collect();
    if !others.is_empty() {
        warn!(
            selected = selected.number,
            ?others,
            "Several open projects; using the first. Pass a project number to choose"
        );
    }

    Ok(selected)
}

/// Pick the first sprint-like field of a project
pub fn select_sprint_field(project: &Project) -> Result<&Field> {
    let mut candidates = project.fields.iter().filter(|f| is_sprint_field_name(&f.name));
    let field = candidates.next().ok_or_else(|| {
        Error::NotFound(format!(
            "No sprint-related fields found in project '{}'",
            project.title
        ))
    })?;

    let others: Vec<&str> = candidates.map(|f| f.name.as_str()).collect();
    if !others.is_empty() {
        warn!(selected = %field.name, ?others, "Several sprint-like fields; using the first");
    }

    Ok(field)
}

/// Whether an item's value for `field_id` is titled exactly `label`
pub fn item_in_sprint(item: &ProjectItem, field_id: &str, label: &str) -> bool {
    item.value_for_field(field_id)
        .and_then(|v| v.iteration_title())
        .is_some_and(|title| title == label)
}

/// Resolve the items of one sprint
pub async fn resolve_sprint_items<S: ProjectSource + ?Sized>(
    source: &S,
    repo: &RepoRef,
    query: &SprintQuery,
    limits: PaginationConfig,
) -> Result<SprintDetails> {
    let label = query.label();
    debug!(%repo, sprint = %label, "Resolving sprint items");

    let projects = source.projects(repo).await?;
    debug!(count = projects.len(), "Projects fetched");

    let project = select_project(&projects, query.project_number)?;
    let field = select_sprint_field(project)?;
    debug!(project = %project.title, field = %field.name, "Sprint field selected");

    let mut items = Vec::new();
    let mut after: Option<String> = None;
    let mut pages = 0u32;
    loop {
        if pages >= limits.max_pages {
            return Err(Error::PageLimit {
                resource: "project items",
                max_pages: limits.max_pages,
                setting: "pagination.max_pages",
            });
        }

        let page = source
            .item_page(&project.id, after.as_deref(), limits.page_size)
            .await?;
        pages += 1;

        let fetched = page.items.len();
        let before = items.len();
        items.extend(
            page.items
                .into_iter()
                .filter(|item| item_in_sprint(item, &field.id, &label)),
        );
        debug!(
            page = pages,
            fetched,
            matched = items.len() - before,
            "Fetched project item page"
        );

        match (page.has_next_page, page.end_cursor) {
            (true, Some(cursor)) => after = Some(cursor),
            (true, None) => {
                warn!(page = pages, "Next page reported without a cursor; stopping");
                break;
            }
            (false, _) => break,
        }
    }

    info!(%repo, sprint = %label, pages, count = items.len(), "Resolved sprint items");

    Ok(SprintDetails {
        project: ProjectSummary {
            id: project.id.clone(),
            title: project.title.clone(),
            number: project.number,
        },
        field: FieldSummary {
            id: field.id.clone(),
            name: field.name.clone(),
        },
        sprint: label,
        items,
        pages_fetched: pages,
        candidate_fields: project
            .fields
            .iter()
            .filter(|f| is_sprint_field_name(&f.name))
            .map(|f| f.name.clone())
            .collect(),
    })
}
