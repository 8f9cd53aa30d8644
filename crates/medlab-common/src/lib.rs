//! MedLab Common Library
//!
//! Shared error handling, environment helpers and logging for the MedLab
//! pipelines.
//!
//! # Overview
//!
//! - **Error Handling**: `MedlabError` and the `Result` alias
//! - **Environment**: typed readers for required and optional variables
//! - **Logging**: `tracing` subscriber setup shared by every Lambda binary
//!
//! # Example
//!
//! ```no_run
//! use medlab_common::env;
//! use medlab_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> medlab_common::Result<()> {
//!     init_logging(&LogConfig::default().merge_env()?)?;
//!     let host = env::required("DB_HOST")?;
//!     tracing::info!(%host, "configured");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod env;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{MedlabError, Result};
