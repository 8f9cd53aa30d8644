//! Rows read by the cumulative report and the typed result sections built
//! from them.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::error::{PipelineError, PipelineResult};
use crate::parser::olympus::Analyte;

/// One row of the patient → request → specimen → result → machine join.
///
/// Every column after `patient_id` comes from a left join and may be NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct PatientResultRow {
    pub patient_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub created_by: Option<String>,
    pub accession_number: Option<String>,
    pub specimen_type: Option<String>,
    pub results_table: Option<String>,
    pub requested_at: Option<String>,
}

/// Instrument family of a stored result, keyed by its result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultKind {
    Olympus,
    Sciex,
    FilmArray,
}

impl ResultKind {
    pub const ALL: [ResultKind; 3] = [ResultKind::Olympus, ResultKind::Sciex, ResultKind::FilmArray];

    pub fn table(self) -> &'static str {
        match self {
            ResultKind::Olympus => "result_machine_olympus",
            ResultKind::Sciex => "result_machine_sciex",
            ResultKind::FilmArray => "result_machine_film_array",
        }
    }

    /// Resolve the table name stored on a specimen result. NULL and unknown
    /// names are both rejected.
    pub fn from_table(name: Option<&str>) -> PipelineResult<Self> {
        let name = name.unwrap_or("NULL");
        Self::ALL
            .into_iter()
            .find(|kind| kind.table() == name)
            .ok_or_else(|| PipelineError::UnsupportedResultTable(name.to_string()))
    }
}

/// A `result_machine_olympus` row
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct OlympusResult {
    pub amphetamine: Option<String>,
    pub barbiturates: Option<String>,
    pub benzodiazepine: Option<String>,
    pub cocaine: Option<String>,
    pub methadone: Option<String>,
    pub opiates: Option<String>,
    pub oxycodone: Option<String>,
    pub phencyclidine_pcp: Option<String>,
    pub thc_cooh: Option<String>,
    pub ecstacy_mdma: Option<String>,
}

impl OlympusResult {
    pub fn value(&self, analyte: Analyte) -> Option<&str> {
        let value = match analyte {
            Analyte::Amphetamine => &self.amphetamine,
            Analyte::Barbiturates => &self.barbiturates,
            Analyte::Benzodiazepine => &self.benzodiazepine,
            Analyte::Cocaine => &self.cocaine,
            Analyte::Methadone => &self.methadone,
            Analyte::Opiates => &self.opiates,
            Analyte::Oxycodone => &self.oxycodone,
            Analyte::Phencyclidine => &self.phencyclidine_pcp,
            Analyte::ThcCooh => &self.thc_cooh,
            Analyte::EcstasyMdma => &self.ecstacy_mdma,
        };
        value.as_deref()
    }
}

/// A `result_machine_sciex` row
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct SciexResult {
    pub component_name: Option<String>,
    pub actual_concentration: Option<String>,
    pub calculated_concentration: Option<String>,
}

/// A `result_machine_film_array` row
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct FilmArrayTestRow {
    pub test_id: i64,
    pub test_name: Option<String>,
    pub test_identifier: Option<String>,
}

/// A `result_machine_film_array_group` row
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct FilmArrayGroupRow {
    pub result_group_id: i64,
    pub result_group_name: Option<String>,
}

/// A `result_machine_film_array_group_item` row
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct FilmArrayItemRow {
    pub result_test_name: Option<String>,
    pub observation_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmArrayGroup {
    pub group: FilmArrayGroupRow,
    pub items: Vec<FilmArrayItemRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmArrayResult {
    pub test: FilmArrayTestRow,
    pub groups: Vec<FilmArrayGroup>,
}

/// Results of one specimen, typed by instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrumentResults {
    Olympus(Vec<OlympusResult>),
    Sciex(Vec<SciexResult>),
    FilmArray(Vec<FilmArrayResult>),
}

impl InstrumentResults {
    /// Whether the result table had no rows for the specimen.
    pub fn is_empty(&self) -> bool {
        match self {
            InstrumentResults::Olympus(rows) => rows.is_empty(),
            InstrumentResults::Sciex(rows) => rows.is_empty(),
            InstrumentResults::FilmArray(rows) => rows.is_empty(),
        }
    }
}

/// One specimen's block in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSection {
    pub accession_number: String,
    pub specimen_type: String,
    pub requested_at: Option<String>,
    pub results: InstrumentResults,
}

/// Patient block at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInfo {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
}

impl PatientInfo {
    pub fn from_row(patient_id: &str, row: &PatientResultRow) -> Self {
        Self {
            id: patient_id.to_string(),
            first_name: row.first_name.clone().unwrap_or_default(),
            last_name: row.last_name.clone().unwrap_or_default(),
            gender: row.gender.clone().unwrap_or_default(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A `report_cumulative` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub patient_id: String,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    /// Object key the PDF was stored under
    pub filepath: String,
}
