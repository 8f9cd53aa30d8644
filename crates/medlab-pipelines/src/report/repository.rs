//! Report queries
//!
//! Values are cast to text in SQL so the report does not depend on the exact
//! column types of the result tables.

use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use super::model::{
    FilmArrayGroupRow, FilmArrayItemRow, FilmArrayTestRow, OlympusResult, PatientResultRow,
    ReportEntry, SciexResult,
};
use crate::error::PipelineResult;
use crate::parser::olympus::Analyte;

/// Patient → request → specimen → result → machine join.
///
/// The request time is not stored anywhere the join can reach, so
/// `requested_at` is always NULL and the report prints a placeholder.
const PATIENT_RESULTS_QUERY: &str = r#"
    SELECT
        CAST(p.patient_id AS CHAR) AS patient_id,
        CAST(p.first_name AS CHAR) AS first_name,
        CAST(p.last_name AS CHAR) AS last_name,
        CAST(p.gender AS CHAR) AS gender,
        CAST(p.created_by AS CHAR) AS created_by,
        CAST(r.accession_number AS CHAR) AS accession_number,
        CAST(s.type AS CHAR) AS specimen_type,
        CAST(sr.results_table AS CHAR) AS results_table,
        CAST(NULL AS CHAR) AS requested_at
    FROM patient p
    LEFT JOIN service_request r ON r.patient_id = p.patient_id
    LEFT JOIN specimen s ON s.accession_number = r.accession_number
    LEFT JOIN specimen_result sr ON sr.specimen_id = s.specimen_id
    LEFT JOIN medical_machine m ON sr.machine_id = m.machine_id
    WHERE p.patient_id = ?
"#;

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Every specimen result of `patient_id`, one row per join match.
    async fn patient_results(&self, patient_id: &str) -> PipelineResult<Vec<PatientResultRow>>;

    async fn olympus_results(&self, accession_number: &str) -> PipelineResult<Vec<OlympusResult>>;

    async fn sciex_results(&self, sample_name: &str) -> PipelineResult<Vec<SciexResult>>;

    async fn film_array_tests(
        &self,
        specimen_identifier: &str,
    ) -> PipelineResult<Vec<FilmArrayTestRow>>;

    async fn film_array_groups(&self, test_id: i64) -> PipelineResult<Vec<FilmArrayGroupRow>>;

    async fn film_array_items(&self, result_group_id: i64)
        -> PipelineResult<Vec<FilmArrayItemRow>>;

    /// Append to the report history, returning the new row id.
    async fn insert_report(&self, entry: &ReportEntry) -> PipelineResult<u64>;
}

pub struct MySqlReportRepository {
    pool: MySqlPool,
}

impl MySqlReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn olympus_query() -> String {
        let columns: Vec<String> = Analyte::ALL
            .iter()
            .map(|analyte| format!("CAST({0} AS CHAR) AS {0}", analyte.column()))
            .collect();

        format!(
            "SELECT {} FROM result_machine_olympus WHERE accession_number = ?",
            columns.join(", ")
        )
    }
}

#[async_trait]
impl ReportRepository for MySqlReportRepository {
    async fn patient_results(&self, patient_id: &str) -> PipelineResult<Vec<PatientResultRow>> {
        let rows = sqlx::query_as::<_, PatientResultRow>(PATIENT_RESULTS_QUERY)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(patient_id, rows = rows.len(), "Fetched patient results");

        Ok(rows)
    }

    async fn olympus_results(&self, accession_number: &str) -> PipelineResult<Vec<OlympusResult>> {
        let rows = sqlx::query_as::<_, OlympusResult>(&Self::olympus_query())
            .bind(accession_number)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn sciex_results(&self, sample_name: &str) -> PipelineResult<Vec<SciexResult>> {
        let rows = sqlx::query_as::<_, SciexResult>(
            r#"
            SELECT
                CAST(component_name AS CHAR) AS component_name,
                CAST(actual_concentration AS CHAR) AS actual_concentration,
                CAST(calculated_concentration AS CHAR) AS calculated_concentration
            FROM result_machine_sciex
            WHERE sample_name = ?
            "#,
        )
        .bind(sample_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn film_array_tests(
        &self,
        specimen_identifier: &str,
    ) -> PipelineResult<Vec<FilmArrayTestRow>> {
        let rows = sqlx::query_as::<_, FilmArrayTestRow>(
            r#"
            SELECT
                CAST(test_id AS SIGNED) AS test_id,
                CAST(test_name AS CHAR) AS test_name,
                CAST(test_identifier AS CHAR) AS test_identifier
            FROM result_machine_film_array
            WHERE specimen_identifier = ?
            "#,
        )
        .bind(specimen_identifier)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn film_array_groups(&self, test_id: i64) -> PipelineResult<Vec<FilmArrayGroupRow>> {
        let rows = sqlx::query_as::<_, FilmArrayGroupRow>(
            r#"
            SELECT
                CAST(result_group_id AS SIGNED) AS result_group_id,
                CAST(result_group_name AS CHAR) AS result_group_name
            FROM result_machine_film_array_group
            WHERE test_id = ?
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn film_array_items(
        &self,
        result_group_id: i64,
    ) -> PipelineResult<Vec<FilmArrayItemRow>> {
        let rows = sqlx::query_as::<_, FilmArrayItemRow>(
            r#"
            SELECT
                CAST(result_test_name AS CHAR) AS result_test_name,
                CAST(observation_value AS CHAR) AS observation_value
            FROM result_machine_film_array_group_item
            WHERE result_group_id = ?
            "#,
        )
        .bind(result_group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_report(&self, entry: &ReportEntry) -> PipelineResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO report_cumulative (patient_id, created_by, created_at, filepath)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&entry.patient_id)
        .bind(&entry.created_by)
        .bind(entry.created_at)
        .bind(&entry.filepath)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }
}
