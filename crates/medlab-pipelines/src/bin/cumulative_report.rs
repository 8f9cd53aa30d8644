//! Builds a patient's cumulative PDF report and stores it in S3.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use medlab_pipelines::{lambda, ReportConfig};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let (config, store) = lambda::bootstrap().await?;
    let report_config = ReportConfig::from_env().map_err(lambda::fail)?;

    let config = &config;
    let report_config = &report_config;
    let store = &store;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        lambda::handle_report(config, report_config, store, event).await
    }))
    .await
}
