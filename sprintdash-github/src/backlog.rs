//! Backlog statistics over a trailing window

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sprintdash_core::export::{self, ExportFormat};
use sprintdash_core::{BacklogConfig, PaginationConfig};
use tracing::info;

use crate::issues::{collect_issues, Issue, IssueQuery, IssueSource};
use crate::{RepoRef, Result};

/// One issue as listed in a statistics bucket
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// A counted group of issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueBucket {
    pub count: usize,
    pub issues: Vec<IssueSummary>,
}

impl IssueBucket {
    fn from_issues<'a>(issues: impl Iterator<Item = &'a Issue>, with_closed: bool) -> Self {
        let issues: Vec<IssueSummary> = issues
            .map(|issue| IssueSummary {
                number: issue.number,
                title: issue.title.clone(),
                created_at: issue.created_at,
                closed_at: if with_closed { issue.closed_at } else { None },
            })
            .collect();
        Self {
            count: issues.len(),
            issues,
        }
    }
}

/// Backlog item counts for one repository
#[derive(Debug, Clone, Serialize)]
pub struct BacklogStats {
    /// Start of the window
    pub since: DateTime<Utc>,
    /// Label counted in `labeled`
    pub label: String,
    /// Issues created within the window
    #[serde(rename = "newPBIs")]
    pub new: IssueBucket,
    /// Issues created within the window that carry the label
    #[serde(rename = "labeledPBIs")]
    pub labeled: IssueBucket,
    /// Issues closed within the window
    #[serde(rename = "completedPBIs")]
    pub completed: IssueBucket,
}

/// Column headers of the backlog export table
pub const BACKLOG_TABLE_HEADERS: [&str; 2] = ["Metric", "Count"];

impl BacklogStats {
    /// Share of new issues that carry the label, rounded half up to a whole percent
    ///
    /// `None` when nothing was created in the window.
    pub fn labeled_percent(&self) -> Option<usize> {
        let new = self.new.count;
        (new > 0).then(|| (self.labeled.count * 200 + new) / (new * 2))
    }

    /// Export rows in [`BACKLOG_TABLE_HEADERS`] order
    pub fn table_rows(&self) -> Vec<Vec<String>> {
        let share = match self.labeled_percent() {
            Some(percent) => format!("{}%", percent),
            None => "n/a".to_string(),
        };

        vec![
            vec!["New PBIs".to_string(), self.new.count.to_string()],
            vec![
                format!("PBIs with {} Label", self.label),
                format!("{} ({})", self.labeled.count, share),
            ],
            vec!["Completed PBIs".to_string(), self.completed.count.to_string()],
        ]
    }

    /// Render the summary as a table in `format`
    pub fn export(&self, format: ExportFormat) -> String {
        export::render(&BACKLOG_TABLE_HEADERS, &self.table_rows(), format)
    }
}

/// Start of a window ending at `now`, clamped to the earliest representable time
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Bucket already-collected issues; every bucket keeps input order
pub fn compute_backlog_stats(issues: &[Issue], since: DateTime<Utc>, label: &str) -> BacklogStats {
    let created_recently = |issue: &&Issue| issue.created_at >= since;

    BacklogStats {
        since,
        label: label.to_string(),
        new: IssueBucket::from_issues(issues.iter().filter(created_recently), false),
        labeled: IssueBucket::from_issues(
            issues
                .iter()
                .filter(created_recently)
                .filter(|issue| issue.has_label(label)),
            false,
        ),
        completed: IssueBucket::from_issues(
            issues
                .iter()
                .filter(|issue| issue.closed_at.is_some_and(|closed| closed >= since)),
            true,
        ),
    }
}

/// Collect a repository's issues and compute its backlog statistics
pub async fn backlog_stats<S: IssueSource + ?Sized>(
    source: &S,
    repo: &RepoRef,
    limits: PaginationConfig,
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> Result<BacklogStats> {
    let issues = collect_issues(source, repo, &IssueQuery::newest_first(), limits).await?;
    let stats = compute_backlog_stats(&issues, window_start(now, config.window), &config.label);

    info!(
        %repo,
        new = stats.new.count,
        labeled = stats.labeled.count,
        completed = stats.completed.count,
        "Computed backlog statistics"
    );

    Ok(stats)
}
