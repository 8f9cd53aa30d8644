//! FilmArray result message parser.
//!
//! A message describes one test run. It is read whole and converted into a
//! [`FilmArrayRun`] tree (test, then result groups, then results) that the
//! loader persists top-down. Every element listed below is required; a
//! missing one fails the parse with [`ParseError::Xml`].
//!
//! ```text
//! header/{senderName, processingIdentifier, version, dateTime, messageType}
//! requestResult/requestStatus
//! requestResult/testOrder/specimen/specimenIdentifier
//! requestResult/testOrder/test/
//!     universalIdentifier/{testIdentifier, testName, testVersion}
//!     instrumentType, instrumentSerialNumber
//!     disposableData/disposable/{disposableIdentifier, reference, disposableType, lotNumber}
//!     resultGroup*/
//!         {resultGroupCode, resultGroupName, resultGroupCodingSystem}
//!         result*/
//!             resultID/{resultTestCode, resultTestName, resultCodingSystem}
//!             value/testResult/{valueType, observationValue, observationName}
//!             operatorName, resultDateTime
//! ```

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use super::Result;

// ============================================================================
// Parsed tree
// ============================================================================

/// One FilmArray test run with its result groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmArrayRun {
    pub test: TestRecord,
    pub groups: Vec<GroupNode>,
}

impl FilmArrayRun {
    pub fn result_count(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }
}

/// Row for `filmArrayTest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub specimen_identifier: String,
    pub test_identifier: String,
    pub test_name: String,
    pub test_version: String,
    pub instrument_type: String,
    pub instrument_serial_number: String,
    pub disposable_identifier: String,
    pub disposable_reference: String,
    pub disposable_type: String,
    pub disposable_lot_number: String,
    pub sender_name: String,
    pub processing_identifier: String,
    pub version: String,
    pub date_time: String,
    pub message_type: String,
    pub request_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub group: ResultGroupRecord,
    pub results: Vec<ResultRecord>,
}

/// Row for `resultGroup`, minus the parent test id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultGroupRecord {
    pub code: String,
    pub name: String,
    pub coding_system: String,
}

/// Row for `result`, minus the parent group id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub test_code: String,
    pub test_name: String,
    pub coding_system: String,
    pub value_type: String,
    pub observation_value: String,
    pub observation_name: String,
    pub operator_name: String,
    pub result_date_time: String,
}

// ============================================================================
// XML document shape
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    header: Header,
    request_result: RequestResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    sender_name: String,
    processing_identifier: String,
    version: String,
    date_time: String,
    message_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestResult {
    request_status: String,
    test_order: TestOrder,
}

#[derive(Debug, Deserialize)]
struct TestOrder {
    specimen: Specimen,
    test: Test,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Specimen {
    specimen_identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Test {
    universal_identifier: UniversalIdentifier,
    instrument_type: String,
    instrument_serial_number: String,
    disposable_data: DisposableData,
    #[serde(rename = "resultGroup", default)]
    result_groups: Vec<ResultGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniversalIdentifier {
    test_identifier: String,
    test_name: String,
    test_version: String,
}

#[derive(Debug, Deserialize)]
struct DisposableData {
    disposable: Disposable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Disposable {
    disposable_identifier: String,
    reference: String,
    disposable_type: String,
    lot_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultGroup {
    result_group_code: String,
    result_group_name: String,
    result_group_coding_system: String,
    #[serde(rename = "result", default)]
    results: Vec<ResultEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultEntry {
    #[serde(rename = "resultID")]
    result_id: ResultId,
    value: ResultValue,
    operator_name: String,
    result_date_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultId {
    result_test_code: String,
    result_test_name: String,
    result_coding_system: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultValue {
    test_result: TestResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestResult {
    value_type: String,
    observation_value: String,
    observation_name: String,
}

impl From<Message> for FilmArrayRun {
    fn from(message: Message) -> Self {
        let Message {
            header,
            request_result,
        } = message;
        let TestOrder { specimen, test } = request_result.test_order;
        let disposable = test.disposable_data.disposable;

        let record = TestRecord {
            specimen_identifier: specimen.specimen_identifier,
            test_identifier: test.universal_identifier.test_identifier,
            test_name: test.universal_identifier.test_name,
            test_version: test.universal_identifier.test_version,
            instrument_type: test.instrument_type,
            instrument_serial_number: test.instrument_serial_number,
            disposable_identifier: disposable.disposable_identifier,
            disposable_reference: disposable.reference,
            disposable_type: disposable.disposable_type,
            disposable_lot_number: disposable.lot_number,
            sender_name: header.sender_name,
            processing_identifier: header.processing_identifier,
            version: header.version,
            date_time: header.date_time,
            message_type: header.message_type,
            request_status: request_result.request_status,
        };

        let groups = test
            .result_groups
            .into_iter()
            .map(|group| GroupNode {
                group: ResultGroupRecord {
                    code: group.result_group_code,
                    name: group.result_group_name,
                    coding_system: group.result_group_coding_system,
                },
                results: group.results.into_iter().map(ResultRecord::from).collect(),
            })
            .collect();

        Self {
            test: record,
            groups,
        }
    }
}

impl From<ResultEntry> for ResultRecord {
    fn from(entry: ResultEntry) -> Self {
        Self {
            test_code: entry.result_id.result_test_code,
            test_name: entry.result_id.result_test_name,
            coding_system: entry.result_id.result_coding_system,
            value_type: entry.value.test_result.value_type,
            observation_value: entry.value.test_result.observation_value,
            observation_name: entry.value.test_result.observation_name,
            operator_name: entry.operator_name,
            result_date_time: entry.result_date_time,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse a FilmArray message held in memory.
pub fn parse_str(content: &str) -> Result<FilmArrayRun> {
    let message: Message = quick_xml::de::from_str(content)?;
    Ok(message.into())
}

/// Parse the FilmArray message stored at `path`.
pub fn parse_file(path: &Path) -> Result<FilmArrayRun> {
    let reader = BufReader::new(File::open(path)?);
    let message: Message = quick_xml::de::from_reader(reader)?;
    let run = FilmArrayRun::from(message);

    debug!(
        specimen = %run.test.specimen_identifier,
        groups = run.groups.len(),
        results = run.result_count(),
        "Parsed FilmArray message {}",
        path.display()
    );

    Ok(run)
}
