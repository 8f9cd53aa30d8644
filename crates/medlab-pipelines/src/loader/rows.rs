// Column mappings from parsed records to insert rows

use super::{Row, SqlValue, TableRow};
use crate::db::schema::{self, Table};
use crate::parser::film_array::{ResultGroupRecord, ResultRecord, TestRecord};
use crate::parser::olympus::OlympusRow;
use crate::parser::sciex::SciexRow;

impl TableRow for OlympusRow {
    const TABLE: Table = schema::OLYMPUS;

    fn into_row(self) -> Row {
        let mut row = Vec::with_capacity(Self::TABLE.columns.len());
        row.push(SqlValue::Text(self.accession_number));
        row.push(SqlValue::Text(self.specimen_type));
        row.push(SqlValue::Text(self.patient_name));
        row.extend(self.concentrations.into_iter().map(SqlValue::Text));
        row
    }
}

impl TableRow for SciexRow {
    const TABLE: Table = schema::SCIEX;

    fn into_row(self) -> Row {
        vec![
            SqlValue::Text(self.sample_name),
            SqlValue::Text(self.component_name),
            SqlValue::Text(self.actual_concentration),
            SqlValue::Text(self.calculated_concentration),
        ]
    }
}

impl TableRow for TestRecord {
    const TABLE: Table = schema::FILM_ARRAY_TEST;

    fn into_row(self) -> Row {
        [
            self.specimen_identifier,
            self.test_identifier,
            self.test_name,
            self.test_version,
            self.instrument_type,
            self.instrument_serial_number,
            self.disposable_identifier,
            self.disposable_reference,
            self.disposable_type,
            self.disposable_lot_number,
            self.sender_name,
            self.processing_identifier,
            self.version,
            self.date_time,
            self.message_type,
            self.request_status,
        ]
        .into_iter()
        .map(SqlValue::Text)
        .collect()
    }
}

/// `resultGroup` row owned by the test with id `test_id`
pub fn result_group_row(group: &ResultGroupRecord, test_id: u64) -> Row {
    vec![
        SqlValue::Text(group.code.clone()),
        SqlValue::Text(group.name.clone()),
        SqlValue::Text(group.coding_system.clone()),
        SqlValue::Id(test_id),
    ]
}

/// `result` row owned by the group with id `group_id`
pub fn result_row(result: &ResultRecord, group_id: u64) -> Row {
    let mut row: Row = [
        &result.test_code,
        &result.test_name,
        &result.coding_system,
        &result.value_type,
        &result.observation_value,
        &result.observation_name,
        &result.operator_name,
        &result.result_date_time,
    ]
    .into_iter()
    .map(|value| SqlValue::Text(value.clone()))
    .collect();
    row.push(SqlValue::Id(group_id));
    row
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parser::olympus::parse_line;

    #[test]
    fn test_olympus_row_matches_columns() {
        let row = parse_line(
            "12345X DOE,JOHN 01 150 1 0 2 200 3 0 4 0 5 0 6 0 7 0 8 0 9 0 10",
        )
        .unwrap()
        .into_row();

        assert_eq!(row.len(), schema::OLYMPUS.columns.len());
        assert_eq!(row[0], SqlValue::Text("12345".to_string()));
        assert_eq!(row[2], SqlValue::Text("DOE JOHN".to_string()));
        assert_eq!(row[5], SqlValue::Text("200".to_string()));
    }

    #[test]
    fn test_child_rows_end_with_parent_id() {
        let group = ResultGroupRecord {
            code: "VIR".to_string(),
            name: "Viruses".to_string(),
            coding_system: "L".to_string(),
        };
        let row = result_group_row(&group, 41);
        assert_eq!(row.len(), schema::RESULT_GROUP.columns.len());
        assert_eq!(row.last(), Some(&SqlValue::Id(41)));

        let result = ResultRecord {
            test_code: "ADV".to_string(),
            test_name: "Adenovirus".to_string(),
            coding_system: "LN".to_string(),
            value_type: "ST".to_string(),
            observation_value: "Not Detected".to_string(),
            observation_name: "Detection".to_string(),
            operator_name: "jdoe".to_string(),
            result_date_time: "20240301115500".to_string(),
        };
        let row = result_row(&result, 7);
        assert_eq!(row.len(), schema::RESULT.columns.len());
        assert_eq!(row.last(), Some(&SqlValue::Id(7)));
    }
}
