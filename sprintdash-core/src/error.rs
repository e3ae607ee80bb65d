//! Error types for sprintdash

use thiserror::Error;

/// Result type alias for sprintdash core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sprintdash core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown export format name
    #[error("Unknown export format '{0}'. Expected markdown or html")]
    UnknownFormat(String),
}
