use tracing::info;

use super::Scratch;
use crate::error::PipelineResult;
use crate::event::ObjectRef;
use crate::loader::{film_array::persist_run, LoadStats, RowSink};
use crate::parser::film_array;
use crate::storage::ObjectStore;

/// Load one FilmArray message as a test → group → result cascade.
pub async fn ingest(
    store: &dyn ObjectStore,
    sink: &dyn RowSink,
    object: &ObjectRef,
) -> PipelineResult<LoadStats> {
    let scratch = Scratch::fetch(store, object).await?;

    let run = film_array::parse_file(scratch.path())?;
    info!(
        specimen = %run.test.specimen_identifier,
        groups = run.groups.len(),
        "XML has been parsed"
    );

    persist_run(sink, run).await
}
