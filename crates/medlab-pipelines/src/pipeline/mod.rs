//! Ingestion pipelines
//!
//! Every pipeline has the same shape per uploaded object: download into a
//! fresh scratch directory, parse, load. Objects of one notification are
//! processed in order and the first failure stops the run. The scratch
//! directory is removed when the object is done, whether it succeeded or not.

use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, instrument};

use crate::db::schema;
use crate::error::PipelineResult;
use crate::event::ObjectRef;
use crate::loader::{LoadStats, RowSink};
use crate::storage::ObjectStore;

pub mod film_array;
pub mod olympus;
pub mod sciex;

/// Instrument family handled by a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Olympus,
    Sciex,
    FilmArray,
}

impl Instrument {
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Olympus => "olympus",
            Instrument::Sciex => "sciex",
            Instrument::FilmArray => "film_array",
        }
    }

    /// Create the target tables when they are missing. Sciex loads into a
    /// table that is expected to exist already.
    pub async fn prepare_tables(self, pool: &MySqlPool, database: &str) -> PipelineResult<()> {
        match self {
            Instrument::Olympus => {
                schema::ensure_olympus_table(pool, database).await?;
            },
            Instrument::FilmArray => {
                schema::ensure_film_array_tables(pool, database).await?;
            },
            Instrument::Sciex => {},
        }
        Ok(())
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary returned to the caller of an ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub objects: usize,
    pub batches: usize,
    pub rows: u64,
}

impl RunStats {
    fn record(&mut self, load: LoadStats) {
        self.objects += 1;
        self.batches += load.batches;
        self.rows += load.rows;
    }
}

/// A downloaded object in its own temporary directory.
///
/// The directory and the file are deleted when this value is dropped.
pub struct Scratch {
    _dir: TempDir,
    path: PathBuf,
}

impl Scratch {
    pub async fn fetch(store: &dyn ObjectStore, object: &ObjectRef) -> PipelineResult<Self> {
        let dir = tempfile::tempdir()?;
        info!(dir = %dir.path().display(), "TEMPDIR has been created");

        let path = dir.path().join(object.file_name());
        store.download_to(&object.bucket, &object.key, &path).await?;
        info!(key = %object.key, "S3 object has been downloaded");

        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One instrument's pipeline bound to its collaborators
pub struct IngestPipeline<'a> {
    instrument: Instrument,
    store: &'a dyn ObjectStore,
    sink: &'a dyn RowSink,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(instrument: Instrument, store: &'a dyn ObjectStore, sink: &'a dyn RowSink) -> Self {
        Self {
            instrument,
            store,
            sink,
        }
    }

    /// Ingest every object in order, stopping at the first failure.
    pub async fn run(&self, objects: &[ObjectRef]) -> PipelineResult<RunStats> {
        let mut stats = RunStats::default();

        for object in objects {
            let load = self.ingest_object(object).await?;
            stats.record(load);
        }

        info!(
            instrument = %self.instrument,
            objects = stats.objects,
            batches = stats.batches,
            rows = stats.rows,
            "DONE"
        );

        Ok(stats)
    }

    #[instrument(skip(self), fields(instrument = %self.instrument))]
    pub async fn ingest_object(&self, object: &ObjectRef) -> PipelineResult<LoadStats> {
        info!(bucket = %object.bucket, key = %object.key, "Object was uploaded");

        match self.instrument {
            Instrument::Olympus => olympus::ingest(self.store, self.sink, object).await,
            Instrument::Sciex => sciex::ingest(self.store, self.sink, object).await,
            Instrument::FilmArray => film_array::ingest(self.store, self.sink, object).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod testing {
    //! In-memory object store for pipeline tests.

    use crate::storage::{ObjectStore, UploadResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        pub objects: Mutex<HashMap<(String, String), Vec<u8>>>,
        pub downloads: Mutex<Vec<String>>,
        /// Local paths handed to `download_to`
        pub destinations: Mutex<Vec<PathBuf>>,
    }

    impl MemoryStore {
        pub fn with_object(bucket: &str, key: &str, data: impl Into<Vec<u8>>) -> Self {
            let store = Self::default();
            store
                .objects
                .lock()
                .unwrap()
                .insert((bucket.to_string(), key.to_string()), data.into());
            store
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> anyhow::Result<u64> {
            self.downloads.lock().unwrap().push(key.to_string());
            self.destinations.lock().unwrap().push(dest.to_path_buf());
            let data = self
                .objects
                .lock()
                .unwrap()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("NoSuchKey: s3://{}/{}", bucket, key))?;
            tokio::fs::write(dest, &data).await?;
            Ok(data.len() as u64)
        }

        async fn upload(
            &self,
            bucket: &str,
            key: &str,
            data: Vec<u8>,
            _content_type: Option<&str>,
        ) -> anyhow::Result<UploadResult> {
            let size = data.len() as u64;
            self.objects
                .lock()
                .unwrap()
                .insert((bucket.to_string(), key.to_string()), data);
            Ok(UploadResult {
                key: key.to_string(),
                size,
            })
        }
    }
}
