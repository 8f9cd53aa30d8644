//! Cumulative patient report
//!
//! Everything the report needs is fetched and rendered before anything is
//! written: a patient without results, a result table with no rows for the
//! specimen, or an unknown result table all fail the report before the PDF is
//! uploaded or the history row inserted.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::ReportConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::storage::{report_key, ObjectStore};

pub mod model;
pub mod pdf;
pub mod render;
pub mod repository;

use model::{
    FilmArrayGroup, FilmArrayResult, InstrumentResults, PatientInfo, PatientResultRow,
    ReportEntry, ResultKind, ResultSection,
};
use pdf::PdfRenderer;
use render::ReportDocument;
use repository::ReportRepository;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const REPORT_TITLE: &str = "Cumulative Report";

/// What one report run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutcome {
    pub patient_id: String,
    pub key: String,
    pub size: u64,
    pub sections: usize,
    pub report_id: u64,
}

/// `{patient_id}_{yyyyMMdd-HHmmss}_{microseconds}.pdf`
pub fn report_file_name(patient_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{:06}.pdf",
        patient_id,
        now.format("%Y%m%d-%H%M%S"),
        now.timestamp_subsec_micros() % 1_000_000
    )
}

/// Report date as printed in the document
pub fn reported_at(now: DateTime<Utc>) -> String {
    now.format("%m/%d/%Y at %H:%M").to_string()
}

/// Load the results of one specimen row, typed by its result table.
pub async fn fetch_section(
    repository: &dyn ReportRepository,
    row: &PatientResultRow,
) -> PipelineResult<ResultSection> {
    let kind = ResultKind::from_table(row.results_table.as_deref())?;
    let accession_number = row.accession_number.clone().unwrap_or_default();

    info!(
        accession_number = %accession_number,
        table = kind.table(),
        "Building specs"
    );

    let results = match kind {
        ResultKind::Olympus => {
            InstrumentResults::Olympus(repository.olympus_results(&accession_number).await?)
        },
        ResultKind::Sciex => {
            InstrumentResults::Sciex(repository.sciex_results(&accession_number).await?)
        },
        ResultKind::FilmArray => {
            let mut results = Vec::new();
            for test in repository.film_array_tests(&accession_number).await? {
                let mut groups = Vec::new();
                for group in repository.film_array_groups(test.test_id).await? {
                    let items = repository.film_array_items(group.result_group_id).await?;
                    groups.push(FilmArrayGroup { group, items });
                }
                results.push(FilmArrayResult { test, groups });
            }
            InstrumentResults::FilmArray(results)
        },
    };

    if results.is_empty() {
        return Err(PipelineError::not_found(
            &format!("{} results", kind.table()),
            &accession_number,
        ));
    }

    Ok(ResultSection {
        accession_number,
        specimen_type: row.specimen_type.clone().unwrap_or_default(),
        requested_at: row.requested_at.clone(),
        results,
    })
}

/// The report pipeline bound to its collaborators
pub struct CumulativeReport<'a> {
    config: &'a ReportConfig,
    repository: &'a dyn ReportRepository,
    renderer: &'a dyn PdfRenderer,
    store: &'a dyn ObjectStore,
}

impl<'a> CumulativeReport<'a> {
    pub fn new(
        config: &'a ReportConfig,
        repository: &'a dyn ReportRepository,
        renderer: &'a dyn PdfRenderer,
        store: &'a dyn ObjectStore,
    ) -> Self {
        Self {
            config,
            repository,
            renderer,
            store,
        }
    }

    /// Build, upload and record the report of `patient_id` as of `now`.
    pub async fn generate(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> PipelineResult<ReportOutcome> {
        let rows = self.repository.patient_results(patient_id).await?;
        let first = rows
            .first()
            .ok_or_else(|| PipelineError::not_found("patient", patient_id))?;

        let mut sections = Vec::with_capacity(rows.len());
        for row in &rows {
            sections.push(fetch_section(self.repository, row).await?);
        }

        let patient = PatientInfo::from_row(patient_id, first);
        let reported_at = reported_at(now);
        let html = render::render_document(&ReportDocument {
            lab_name: &self.config.lab_name,
            reported_at: &reported_at,
            patient: &patient,
            sections: &sections,
        });
        info!(sections = sections.len(), "Report HTML is formatted");

        let pdf = self.renderer.render(REPORT_TITLE, &html)?;
        info!(bytes = pdf.len(), "PDF is generated");

        let key = report_key(&self.config.lab_name, &report_file_name(patient_id, now));
        let upload = self
            .store
            .upload(&self.config.bucket, &key, pdf, Some(PDF_CONTENT_TYPE))
            .await?;
        info!(bucket = %self.config.bucket, key = %upload.key, "PDF is uploaded to bucket");

        let entry = ReportEntry {
            patient_id: patient_id.to_string(),
            created_by: first.created_by.clone(),
            created_at: now.naive_utc().with_nanosecond(0).unwrap_or(now.naive_utc()),
            filepath: upload.key.clone(),
        };
        let report_id = self.repository.insert_report(&entry).await?;
        info!(report_id, "Report is written to DB");

        Ok(ReportOutcome {
            patient_id: patient_id.to_string(),
            key: upload.key,
            size: upload.size,
            sections: sections.len(),
            report_id,
        })
    }
}
