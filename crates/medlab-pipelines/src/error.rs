//! Pipeline error types

use thiserror::Error;

use crate::parser::ParseError;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Every way an ingestion or report invocation can fail.
///
/// Nothing here is retried. Each variant aborts the invocation and is handed
/// back to the Lambda runtime, except [`PipelineError::Connection`], which
/// terminates the process.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] medlab_common::MedlabError),

    #[error("Could not connect to MySQL instance: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Object storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid trigger event: {0}")]
    Event(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unsupported machine result table: {0}")]
    UnsupportedResultTable(String),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a not found error with resource context
    pub fn not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFound(format!("No {} found for '{}'", resource_type, identifier))
    }

    /// Whether the error must terminate the process rather than fail the invocation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
