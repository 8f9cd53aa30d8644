//! Glue between the Lambda runtime and the pipelines.
//!
//! Each invocation opens its own single-connection pool and closes it before
//! returning. Errors are logged once here and handed back to the runtime; a
//! failed database connection ends the process instead.

use aws_lambda_events::event::s3::S3Event;
use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use medlab_common::logging::{init_logging, LogConfig};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::config::{AppConfig, ReportConfig};
use crate::db;
use crate::error::{PipelineError, PipelineResult};
use crate::event::object_refs;
use crate::loader::MySqlSink;
use crate::pipeline::{IngestPipeline, Instrument, RunStats};
use crate::report::pdf::TextPdfRenderer;
use crate::report::repository::MySqlReportRepository;
use crate::report::{CumulativeReport, ReportOutcome};
use crate::storage::{ObjectStore, Storage};

/// Logging, configuration and the storage client, set up once per process.
pub async fn bootstrap() -> Result<(AppConfig, Storage), Error> {
    let log_config =
        LogConfig::for_lambda("sqlx=warn,aws_config=warn,aws_smithy_runtime=warn").merge_env()?;
    init_logging(&log_config)?;

    let config = AppConfig::load().map_err(fail)?;
    let store = Storage::new(config.storage.clone()).await?;

    Ok((config, store))
}

/// Log `err` and convert it for the runtime. Connection failures exit the
/// process.
pub fn fail(err: PipelineError) -> Error {
    if err.is_fatal() {
        error!(error = %err, "Unexpected error: Could not connect to MySQL instance");
        std::process::exit(1);
    }

    error!(error = %err, "Invocation failed");
    Box::new(err)
}

/// Run one ingestion pipeline over every object of an S3 notification.
pub async fn ingest(
    instrument: Instrument,
    config: &AppConfig,
    store: &dyn ObjectStore,
    event: &S3Event,
) -> PipelineResult<RunStats> {
    let pool = db::connect(&config.database).await?;
    instrument.prepare_tables(&pool, &config.database.name).await?;

    let objects = object_refs(event)?;
    let sink = MySqlSink::new(pool.clone());

    let stats = IngestPipeline::new(instrument, store, &sink).run(&objects).await;
    pool.close().await;

    stats
}

pub async fn handle_ingest(
    instrument: Instrument,
    config: &AppConfig,
    store: &dyn ObjectStore,
    event: LambdaEvent<S3Event>,
) -> Result<RunStats, Error> {
    info!(
        request_id = %event.context.request_id,
        %instrument,
        records = event.payload.records.len(),
        "Invocation started"
    );

    ingest(instrument, config, store, &event.payload)
        .await
        .map_err(fail)
}

/// Report invocation payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub patient_id: Option<String>,
}

impl ReportRequest {
    /// An empty (`null`) payload means "use `PATIENT_ID`".
    pub fn from_payload(payload: Value) -> PipelineResult<Self> {
        if payload.is_null() {
            return Ok(Self::default());
        }

        serde_json::from_value(payload)
            .map_err(|e| PipelineError::Event(format!("Invalid report request: {}", e)))
    }
}

pub async fn report(
    config: &AppConfig,
    report_config: &ReportConfig,
    store: &dyn ObjectStore,
    request: ReportRequest,
) -> PipelineResult<ReportOutcome> {
    let patient_id = report_config.resolve_patient_id(request.patient_id.as_deref())?;

    let pool = db::connect(&config.database).await?;
    let repository = MySqlReportRepository::new(pool.clone());
    let renderer = TextPdfRenderer;

    let outcome = CumulativeReport::new(report_config, &repository, &renderer, store)
        .generate(&patient_id, Utc::now())
        .await;
    pool.close().await;

    outcome
}

pub async fn handle_report(
    config: &AppConfig,
    report_config: &ReportConfig,
    store: &dyn ObjectStore,
    event: LambdaEvent<Value>,
) -> Result<ReportOutcome, Error> {
    info!(request_id = %event.context.request_id, "Invocation started");

    let request = ReportRequest::from_payload(event.payload).map_err(fail)?;
    report(config, report_config, store, request)
        .await
        .map_err(fail)
}
