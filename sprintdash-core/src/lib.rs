//! sprintdash core - shared pieces of the sprintdash dashboard
//!
//! Configuration and secrets loading, the core error type, and the table
//! exporter used to turn sprint details into Markdown or HTML tables.

pub mod config;
pub mod error;
pub mod export;
pub mod secrets;

pub use config::{BacklogConfig, Config, GitHubConfig, PaginationConfig, ServerConfig};
pub use error::{Error, Result};
pub use export::{Cell, ExportFormat};
pub use secrets::Secrets;
