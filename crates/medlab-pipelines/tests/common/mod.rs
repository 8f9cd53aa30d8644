//! Shared fakes for the pipeline integration tests
//!
//! - [`FixtureStore`]: serves objects from `tests/fixtures` and records uploads
//! - [`RecordingSink`]: a row sink that hands out sequential ids
//! - [`FakeRepository`]: canned report rows keyed by accession number

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use medlab_pipelines::db::schema::Table;
use medlab_pipelines::loader::{Row, RowSink};
use medlab_pipelines::report::model::{
    FilmArrayGroupRow, FilmArrayItemRow, FilmArrayTestRow, OlympusResult, PatientResultRow,
    ReportEntry, SciexResult,
};
use medlab_pipelines::report::pdf::PdfRenderer;
use medlab_pipelines::report::repository::ReportRepository;
use medlab_pipelines::storage::{ObjectStore, UploadResult};
use medlab_pipelines::PipelineResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("Failed to read fixture")
}

// ============================================================================
// Object store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Maps object keys to fixture files.
#[derive(Default)]
pub struct FixtureStore {
    objects: HashMap<String, PathBuf>,
    pub downloads: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<Upload>>,
}

impl FixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, fixture_name: &str) -> Self {
        self.objects.insert(key.to_string(), fixture(fixture_name));
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FixtureStore {
    async fn download_to(&self, _bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        self.downloads.lock().unwrap().push(key.to_string());
        let source = self
            .objects
            .get(key)
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))?;
        Ok(std::fs::copy(source, dest)?)
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadResult> {
        let size = data.len() as u64;
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            data,
            content_type: content_type.map(str::to_string),
        });
        Ok(UploadResult {
            key: key.to_string(),
            size,
        })
    }
}

// ============================================================================
// Row sink
// ============================================================================

#[derive(Debug, Clone)]
pub struct SinkRow {
    pub table: &'static str,
    pub id: u64,
    pub row: Row,
}

/// Keeps every inserted row; ids are sequential across all tables.
#[derive(Default)]
pub struct RecordingSink {
    rows: Mutex<Vec<SinkRow>>,
    pub batch_sizes: Mutex<Vec<usize>>,
}

impl RecordingSink {
    pub fn rows(&self, table: &str) -> Vec<SinkRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.table == table)
            .cloned()
            .collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    fn push(&self, table: &Table, row: Row) -> u64 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as u64 + 1;
        rows.push(SinkRow {
            table: table.name,
            id,
            row,
        });
        id
    }
}

#[async_trait]
impl RowSink for RecordingSink {
    async fn insert_one(&self, table: &Table, row: Row) -> PipelineResult<u64> {
        Ok(self.push(table, row))
    }

    async fn insert_batch(&self, table: &Table, rows: Vec<Row>) -> PipelineResult<u64> {
        self.batch_sizes.lock().unwrap().push(rows.len());
        let count = rows.len() as u64;
        for row in rows {
            self.push(table, row);
        }
        Ok(count)
    }
}

// ============================================================================
// Report collaborators
// ============================================================================

#[derive(Default)]
pub struct FakeRepository {
    pub patients: HashMap<String, Vec<PatientResultRow>>,
    pub olympus: HashMap<String, Vec<OlympusResult>>,
    pub sciex: HashMap<String, Vec<SciexResult>>,
    pub film_array_tests: HashMap<String, Vec<FilmArrayTestRow>>,
    pub film_array_groups: HashMap<i64, Vec<FilmArrayGroupRow>>,
    pub film_array_items: HashMap<i64, Vec<FilmArrayItemRow>>,
    pub reports: Mutex<Vec<ReportEntry>>,
}

impl FakeRepository {
    pub fn reports(&self) -> Vec<ReportEntry> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportRepository for FakeRepository {
    async fn patient_results(&self, patient_id: &str) -> PipelineResult<Vec<PatientResultRow>> {
        Ok(self.patients.get(patient_id).cloned().unwrap_or_default())
    }

    async fn olympus_results(&self, accession_number: &str) -> PipelineResult<Vec<OlympusResult>> {
        Ok(self.olympus.get(accession_number).cloned().unwrap_or_default())
    }

    async fn sciex_results(&self, sample_name: &str) -> PipelineResult<Vec<SciexResult>> {
        Ok(self.sciex.get(sample_name).cloned().unwrap_or_default())
    }

    async fn film_array_tests(
        &self,
        specimen_identifier: &str,
    ) -> PipelineResult<Vec<FilmArrayTestRow>> {
        Ok(self
            .film_array_tests
            .get(specimen_identifier)
            .cloned()
            .unwrap_or_default())
    }

    async fn film_array_groups(&self, test_id: i64) -> PipelineResult<Vec<FilmArrayGroupRow>> {
        Ok(self.film_array_groups.get(&test_id).cloned().unwrap_or_default())
    }

    async fn film_array_items(
        &self,
        result_group_id: i64,
    ) -> PipelineResult<Vec<FilmArrayItemRow>> {
        Ok(self
            .film_array_items
            .get(&result_group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_report(&self, entry: &ReportEntry) -> PipelineResult<u64> {
        let mut reports = self.reports.lock().unwrap();
        reports.push(entry.clone());
        Ok(reports.len() as u64)
    }
}

/// Returns the HTML it was given, so tests can inspect the rendered document.
#[derive(Default)]
pub struct EchoRenderer {
    pub rendered: Mutex<Vec<String>>,
}

impl EchoRenderer {
    pub fn last_html(&self) -> String {
        self.rendered.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl PdfRenderer for EchoRenderer {
    fn render(&self, _title: &str, html: &str) -> PipelineResult<Vec<u8>> {
        self.rendered.lock().unwrap().push(html.to_string());
        Ok(html.as_bytes().to_vec())
    }
}
