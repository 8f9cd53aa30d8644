//! Error types shared across MedLab crates

use thiserror::Error;

/// Result type alias for MedLab operations
pub type Result<T> = std::result::Result<T, MedlabError>;

/// Main error type for shared MedLab helpers
#[derive(Error, Debug)]
pub enum MedlabError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable {name}: '{value}'")]
    InvalidEnv { name: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MedlabError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
