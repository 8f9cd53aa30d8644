use tracing::info;

use super::Scratch;
use crate::error::PipelineResult;
use crate::event::ObjectRef;
use crate::loader::{BatchLoader, LoadStats, RowSink};
use crate::parser::sciex::{Delimiter, SciexReader, SCIEX_BATCH_SIZE};
use crate::parser::BatchExt;
use crate::storage::ObjectStore;

/// Load one Sciex export into `sciex`, 80,000 rows per commit.
pub async fn ingest(
    store: &dyn ObjectStore,
    sink: &dyn RowSink,
    object: &ObjectRef,
) -> PipelineResult<LoadStats> {
    let delimiter = Delimiter::from_extension(object.extension())?;

    let scratch = Scratch::fetch(store, object).await?;
    let rows = SciexReader::open(scratch.path())?;
    info!(?delimiter, "File has been read");

    BatchLoader::new(sink)
        .load(rows.batches(SCIEX_BATCH_SIZE))
        .await
}
