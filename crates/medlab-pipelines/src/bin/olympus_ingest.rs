//! Loads uploaded Olympus .log results into MySQL.

use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use medlab_pipelines::lambda;
use medlab_pipelines::pipeline::Instrument;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let (config, store) = lambda::bootstrap().await?;
    let config = &config;
    let store = &store;

    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        lambda::handle_ingest(Instrument::Olympus, config, store, event).await
    }))
    .await
}
