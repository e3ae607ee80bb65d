//! sprintdash GitHub - GitHub access for the sprintdash dashboard
//!
//! This crate walks GitHub's REST and GraphQL APIs to collect repository
//! issues, compute backlog statistics, resolve the items of a sprint on a
//! Projects (v2) board, and list the repositories a user works on.
//!
//! Each routine takes its data source explicitly. [`GitHubClient`] is the
//! real source; the traits let tests substitute in-memory ones.

pub mod backlog;
mod client;
mod error;
mod graphql;
pub mod issues;
pub mod projects;
pub mod repositories;
pub mod sprint;

pub use backlog::{backlog_stats, BacklogStats};
pub use client::{GitHubClient, RepoRef};
pub use error::{Error, Result};
pub use issues::{collect_issues, Issue, IssueQuery, IssueSource};
pub use projects::{Project, ProjectItem, ProjectSource};
pub use repositories::{list_repositories, Repository, RepositorySource};
pub use sprint::{resolve_sprint_items, SprintDetails, SprintQuery};

/// Everything the dashboard reads from GitHub
pub trait GitHubApi: IssueSource + ProjectSource + RepositorySource {}

impl<T: IssueSource + ProjectSource + RepositorySource> GitHubApi for T {}
