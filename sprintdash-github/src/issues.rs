//! Issue fetching and page-by-page collection

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::models::issues::Issue as OctocrabIssue;
use octocrab::params;
use serde::{Deserialize, Serialize};
use sprintdash_core::PaginationConfig;
use tracing::{debug, info};

use crate::{Error, GitHubClient, RepoRef, Result};

/// Which issues to list by state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

/// Sort key for issue listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSort {
    Created,
    Updated,
}

/// Sort direction for issue listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Filter options for listing issues
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    /// Filter by state (default: open)
    pub state: StateFilter,
    /// Sort key, GitHub's default when unset
    pub sort: Option<IssueSort>,
    /// Sort direction, GitHub's default when unset
    pub direction: Option<SortDirection>,
    /// Filter by labels (all must match)
    pub labels: Vec<String>,
}

impl IssueQuery {
    /// Every issue, newest first
    pub fn newest_first() -> Self {
        Self {
            state: StateFilter::All,
            sort: Some(IssueSort::Created),
            direction: Some(SortDirection::Desc),
            labels: Vec::new(),
        }
    }
}

/// GitHub issue snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Web URL of the issue
    pub url: String,
    /// When the issue was created
    pub created_at: DateTime<Utc>,
    /// When the issue was closed, if it is
    pub closed_at: Option<DateTime<Utc>>,
    /// Label names
    pub labels: Vec<String>,
    /// The REST issues endpoint also returns pull requests
    #[serde(skip)]
    pub is_pull_request: bool,
}

impl Issue {
    /// Whether the issue carries a label with exactly this name
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

impl From<OctocrabIssue> for Issue {
    fn from(issue: OctocrabIssue) -> Self {
        Issue {
            number: issue.number,
            title: issue.title,
            url: issue.html_url.to_string(),
            created_at: issue.created_at,
            closed_at: issue.closed_at,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            is_pull_request: issue.pull_request.is_some(),
        }
    }
}

/// A source of issue pages
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch one page (1-based) of issues, pull requests included
    async fn issue_page(
        &self,
        repo: &RepoRef,
        query: &IssueQuery,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Issue>>;
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn issue_page(
        &self,
        repo: &RepoRef,
        query: &IssueQuery,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Issue>> {
        let issues_handler = self.client().issues(&repo.owner, &repo.name);
        let mut builder = issues_handler
            .list()
            .state(match query.state {
                StateFilter::Open => params::State::Open,
                StateFilter::Closed => params::State::Closed,
                StateFilter::All => params::State::All,
            })
            .per_page(per_page)
            .page(page);

        if let Some(sort) = query.sort {
            builder = builder.sort(match sort {
                IssueSort::Created => params::issues::Sort::Created,
                IssueSort::Updated => params::issues::Sort::Updated,
            });
        }

        if let Some(direction) = query.direction {
            builder = builder.direction(match direction {
                SortDirection::Asc => params::Direction::Ascending,
                SortDirection::Desc => params::Direction::Descending,
            });
        }

        if !query.labels.is_empty() {
            builder = builder.labels(&query.labels);
        }

        let issues = builder.send().await?;
        Ok(issues.items.into_iter().map(Issue::from).collect())
    }
}

/// Collect every issue of a repository, skipping pull requests
///
/// Pages are requested until one comes back shorter than the page size.
/// Any failed fetch aborts the whole collection. Fetching more than
/// `limits.max_issue_pages` pages fails with [`Error::PageLimit`].
pub async fn collect_issues<S: IssueSource + ?Sized>(
    source: &S,
    repo: &RepoRef,
    query: &IssueQuery,
    limits: PaginationConfig,
) -> Result<Vec<Issue>> {
    debug!(%repo, ?query, "Collecting issues");

    let mut all_issues = Vec::new();
    let mut page = 1u32;
    loop {
        if page > limits.max_issue_pages {
            return Err(Error::PageLimit {
                resource: "issues",
                max_pages: limits.max_issue_pages,
                setting: "pagination.max_issue_pages",
            });
        }

        let batch = source
            .issue_page(repo, query, page, limits.page_size)
            .await?;
        let fetched = batch.len();

        all_issues.extend(batch.into_iter().filter(|issue| !issue.is_pull_request));
        debug!(page, fetched, total = all_issues.len(), "Fetched issue page");

        if fetched < usize::from(limits.page_size) {
            break;
        }
        page += 1;
    }

    info!(%repo, count = all_issues.len(), pages = page, "Collected issues");

    Ok(all_issues)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    pub(crate) fn issue(number: u64, created_at: DateTime<Utc>) -> Issue {
        Issue {
            number,
            title: format!("Issue {}", number),
            url: format!("https://github.com/org/repo/issues/{}", number),
            created_at,
            closed_at: None,
            labels: Vec::new(),
            is_pull_request: false,
        }
    }

    /// Serves a fixed list of issues in pages and records requested pages
    pub(crate) struct FakeIssues {
        pub(crate) issues: Vec<Issue>,
        pub(crate) requested: Mutex<Vec<u32>>,
        pub(crate) fail_on_page: Option<u32>,
    }

    impl FakeIssues {
        pub(crate) fn new(issues: Vec<Issue>) -> Self {
            Self {
                issues,
                requested: Mutex::new(Vec::new()),
                fail_on_page: None,
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IssueSource for FakeIssues {
        async fn issue_page(
            &self,
            _repo: &RepoRef,
            _query: &IssueQuery,
            page: u32,
            per_page: u8,
        ) -> Result<Vec<Issue>> {
            self.requested.lock().unwrap().push(page);
            if self.fail_on_page == Some(page) {
                return Err(Error::RateLimited("API rate limit exceeded".to_string()));
            }
            let per_page = usize::from(per_page);
            Ok(self
                .issues
                .iter()
                .skip((page as usize - 1) * per_page)
                .take(per_page)
                .cloned()
                .collect())
        }
    }

    /// Always answers with a full page
    struct EndlessIssues;

    #[async_trait]
    impl IssueSource for EndlessIssues {
        async fn issue_page(
            &self,
            _repo: &RepoRef,
            _query: &IssueQuery,
            page: u32,
            per_page: u8,
        ) -> Result<Vec<Issue>> {
            let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            Ok((0..u64::from(per_page))
                .map(|i| issue(u64::from(page) * 1000 + i, created))
                .collect())
        }
    }

    fn repo() -> RepoRef {
        RepoRef::new("org", "repo")
    }

    fn numbered(count: u64) -> Vec<Issue> {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        (1..=count).map(|n| issue(n, created)).collect()
    }

    #[tokio::test]
    async fn test_collects_two_pages() {
        let source = FakeIssues::new(numbered(120));

        let issues = collect_issues(
            &source,
            &repo(),
            &IssueQuery::default(),
            PaginationConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(issues.len(), 120);
        assert_eq!(source.requested(), vec![1, 2]);
        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, (1..=120).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_exact_multiple_fetches_empty_page() {
        let source = FakeIssues::new(numbered(200));

        let issues = collect_issues(
            &source,
            &repo(),
            &IssueQuery::default(),
            PaginationConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(issues.len(), 200);
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_pull_requests_are_dropped_but_count_toward_page_length() {
        let mut all = numbered(7);
        for issue in all.iter_mut().filter(|i| i.number % 3 == 0) {
            issue.is_pull_request = true;
        }
        let source = FakeIssues::new(all);
        let limits = PaginationConfig {
            page_size: 3,
            max_issue_pages: 10,
            ..PaginationConfig::default()
        };

        let issues = collect_issues(&source, &repo(), &IssueQuery::default(), limits)
            .await
            .unwrap();

        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 4, 5, 7]);
        // pages: [1,2,3] [4,5,6] [7] - the second page is full despite one PR
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failure_discards_partial_results() {
        let mut source = FakeIssues::new(numbered(250));
        source.fail_on_page = Some(2);

        let err = collect_issues(
            &source,
            &repo(),
            &IssueQuery::default(),
            PaginationConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_page_limit_stops_endless_source() {
        let limits = PaginationConfig {
            page_size: 10,
            max_issue_pages: 4,
            ..PaginationConfig::default()
        };

        let err = collect_issues(&EndlessIssues, &repo(), &IssueQuery::default(), limits)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::PageLimit {
                resource: "issues",
                max_pages: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_large_repository_within_default_bound() {
        let source = FakeIssues::new(numbered(5000));

        let issues = collect_issues(
            &source,
            &repo(),
            &IssueQuery::default(),
            PaginationConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(issues.len(), 5000);
        assert_eq!(source.requested().len(), 51);
    }

    #[test]
    fn test_newest_first_query() {
        let query = IssueQuery::newest_first();
        assert_eq!(query.state, StateFilter::All);
        assert_eq!(query.sort, Some(IssueSort::Created));
        assert_eq!(query.direction, Some(SortDirection::Desc));
    }

    #[test]
    fn test_has_label() {
        let mut issue = issue(1, Utc::now());
        issue.labels = vec!["bug".to_string(), "YakShaver".to_string()];
        assert!(issue.has_label("YakShaver"));
        assert!(!issue.has_label("yakshaver"));
    }
}
