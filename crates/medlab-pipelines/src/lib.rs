//! MedLab result pipelines
//!
//! Lab instrument result files land in S3 and are loaded into MySQL by one
//! Lambda per instrument family; a fourth Lambda assembles a patient's
//! cumulative PDF report from the stored results.
//!
//! - [`pipeline`]: Olympus `.log`, Sciex `.txt`/`.csv` and FilmArray XML ingestion
//! - [`report`]: the cumulative report
//! - [`lambda`]: runtime glue shared by the binaries
//!
//! Collaborators sit behind traits ([`storage::ObjectStore`],
//! [`loader::RowSink`], [`report::repository::ReportRepository`],
//! [`report::pdf::PdfRenderer`]) so the pipelines run against in-memory
//! substitutes in tests.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod lambda;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod storage;

pub use config::{AppConfig, ReportConfig};
pub use error::{PipelineError, PipelineResult};
