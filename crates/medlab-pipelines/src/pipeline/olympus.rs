use tracing::info;

use super::Scratch;
use crate::error::PipelineResult;
use crate::event::ObjectRef;
use crate::loader::{BatchLoader, LoadStats, RowSink};
use crate::parser::olympus::{self, OlympusReader, OLYMPUS_BATCH_SIZE};
use crate::parser::{BatchExt, ParseError};
use crate::storage::ObjectStore;

/// Load one Olympus log into `olympus`, 10,000 rows per commit.
///
/// Keys without a `.log` extension are rejected before anything is downloaded.
pub async fn ingest(
    store: &dyn ObjectStore,
    sink: &dyn RowSink,
    object: &ObjectRef,
) -> PipelineResult<LoadStats> {
    if !olympus::is_supported_extension(object.extension()) {
        return Err(ParseError::UnsupportedFileType(
            object.extension().unwrap_or_default().to_string(),
        )
        .into());
    }

    let scratch = Scratch::fetch(store, object).await?;
    let rows = OlympusReader::open(scratch.path())?;
    info!("File has been read");

    BatchLoader::new(sink)
        .load(rows.batches(OLYMPUS_BATCH_SIZE))
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::loader::testing::MemorySink;
    use crate::loader::SqlValue;
    use crate::pipeline::testing::MemoryStore;

    const LINE: &str =
        "12345X    DOE,JOHN         01  150 1  0 2  200 3  0 4  0 5  0 6  0 7  0 8  0 9  0 10";

    #[tokio::test]
    async fn test_ingest_sample_log() {
        let store = MemoryStore::with_object("uploads", "runs/day1.LOG", format!("{LINE}\n\n{LINE}\n"));
        let sink = MemorySink::default();

        let stats = ingest(&store, &sink, &ObjectRef::new("uploads", "runs/day1.LOG"))
            .await
            .unwrap();

        assert_eq!(stats, LoadStats { batches: 1, rows: 2 });
        let rows = sink.rows("olympus");
        assert_eq!(rows[0].row[0], SqlValue::Text("12345".to_string()));
        assert_eq!(rows[0].row[1], SqlValue::Text("X".to_string()));
        assert_eq!(rows[0].row[2], SqlValue::Text("DOE JOHN".to_string()));
    }

    #[tokio::test]
    async fn test_wrong_extension_is_not_downloaded() {
        let store = MemoryStore::with_object("uploads", "runs/day1.txt", LINE);
        let sink = MemorySink::default();

        let err = ingest(&store, &sink, &ObjectRef::new("uploads", "runs/day1.txt"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::UnsupportedFileType(ref ext)) if ext == "txt"
        ));
        assert!(store.downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batches_are_bounded() {
        let content = format!("{LINE}\n").repeat(OLYMPUS_BATCH_SIZE + 5);
        let store = MemoryStore::with_object("uploads", "big.log", content);
        let sink = MemorySink::default();

        let stats = ingest(&store, &sink, &ObjectRef::new("uploads", "big.log"))
            .await
            .unwrap();

        assert_eq!(stats.batches, 2);
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![OLYMPUS_BATCH_SIZE, 5]);
    }

    #[tokio::test]
    async fn test_malformed_line_fails_the_load() {
        let content = format!("{LINE}\n12345X DOE NO MARKER\n");
        let store = MemoryStore::with_object("uploads", "bad.log", content);
        let sink = MemorySink::default();

        let err = ingest(&store, &sink, &ObjectRef::new("uploads", "bad.log"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::Olympus { line: 2, .. })
        ));
        assert!(sink.rows("olympus").is_empty());
    }
}
