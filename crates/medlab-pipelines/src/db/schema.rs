//! Tables written by the ingestion pipelines.
//!
//! The report side reads a different set of tables (`result_machine_*`), which
//! this crate never creates; see `report::repository`.

use sqlx::MySqlPool;
use tracing::info;

use super::tables_exist;
use crate::error::PipelineResult;

/// Target of an insert: table name plus column list, in bind order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const OLYMPUS: Table = Table {
    name: "olympus",
    columns: &[
        "accession_number",
        "specimen_type",
        "patient_name",
        "amphetamine",
        "barbiturates",
        "benzodiazepine",
        "cocaine",
        "methadone",
        "opiates",
        "oxycodone",
        "phencyclidine_pcp",
        "thc_cooh",
        "ecstacy_mdma",
    ],
};

pub const SCIEX: Table = Table {
    name: "sciex",
    columns: &[
        "sample_name",
        "component_name",
        "actual_concentration",
        "calculated_concentration",
    ],
};

pub const FILM_ARRAY_TEST: Table = Table {
    name: "filmArrayTest",
    columns: &[
        "specimen_identifier",
        "test_identifier",
        "test_name",
        "test_version",
        "test_instrument_type",
        "test_instrument_serial_number",
        "disposable_identifier",
        "disposable_reference",
        "disposable_type",
        "disposable_lot_number",
        "header_info_sender_name",
        "header_info_processing_identifier",
        "header_info_version",
        "header_info_date_time",
        "header_info_message_type",
        "request_status",
    ],
};

pub const RESULT_GROUP: Table = Table {
    name: "resultGroup",
    columns: &[
        "result_group_code",
        "result_group_name",
        "result_group_coding_system",
        "test_id",
    ],
};

pub const RESULT: Table = Table {
    name: "result",
    columns: &[
        "result_test_code",
        "result_test_name",
        "result_coding_system",
        "value_type",
        "observation_value",
        "observation_name",
        "operator_name",
        "result_date_time",
        "result_group_id",
    ],
};

const CREATE_OLYMPUS: &str = r#"
CREATE TABLE IF NOT EXISTS olympus (
    id INT AUTO_INCREMENT PRIMARY KEY,
    accession_number VARCHAR(64) NOT NULL,
    specimen_type VARCHAR(8) NOT NULL,
    patient_name VARCHAR(255),
    amphetamine VARCHAR(32),
    barbiturates VARCHAR(32),
    benzodiazepine VARCHAR(32),
    cocaine VARCHAR(32),
    methadone VARCHAR(32),
    opiates VARCHAR(32),
    oxycodone VARCHAR(32),
    phencyclidine_pcp VARCHAR(32),
    thc_cooh VARCHAR(32),
    ecstacy_mdma VARCHAR(32),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    INDEX idx_olympus_accession (accession_number)
) CHARACTER SET utf8mb4
"#;

const CREATE_FILM_ARRAY_TEST: &str = r#"
CREATE TABLE IF NOT EXISTS filmArrayTest (
    id INT AUTO_INCREMENT PRIMARY KEY,
    specimen_identifier VARCHAR(255),
    test_identifier VARCHAR(255),
    test_name VARCHAR(255),
    test_version VARCHAR(255),
    test_instrument_type VARCHAR(255),
    test_instrument_serial_number VARCHAR(255),
    disposable_identifier VARCHAR(255),
    disposable_reference VARCHAR(255),
    disposable_type VARCHAR(255),
    disposable_lot_number VARCHAR(255),
    header_info_sender_name VARCHAR(255),
    header_info_processing_identifier VARCHAR(255),
    header_info_version VARCHAR(255),
    header_info_date_time VARCHAR(255),
    header_info_message_type VARCHAR(255),
    request_status VARCHAR(255),
    INDEX idx_film_array_specimen (specimen_identifier)
) CHARACTER SET utf8mb4
"#;

const CREATE_RESULT_GROUP: &str = r#"
CREATE TABLE IF NOT EXISTS resultGroup (
    id INT AUTO_INCREMENT PRIMARY KEY,
    result_group_code VARCHAR(255),
    result_group_name VARCHAR(255),
    result_group_coding_system VARCHAR(255),
    test_id INT NOT NULL,
    FOREIGN KEY (test_id) REFERENCES filmArrayTest(id)
) CHARACTER SET utf8mb4
"#;

const CREATE_RESULT: &str = r#"
CREATE TABLE IF NOT EXISTS result (
    id INT AUTO_INCREMENT PRIMARY KEY,
    result_test_code VARCHAR(255),
    result_test_name VARCHAR(255),
    result_coding_system VARCHAR(255),
    value_type VARCHAR(255),
    observation_value VARCHAR(255),
    observation_name VARCHAR(255),
    operator_name VARCHAR(255),
    result_date_time VARCHAR(255),
    result_group_id INT NOT NULL,
    FOREIGN KEY (result_group_id) REFERENCES resultGroup(id)
) CHARACTER SET utf8mb4
"#;

/// Create the `olympus` table when it is missing. Returns whether it was created.
pub async fn ensure_olympus_table(pool: &MySqlPool, database: &str) -> PipelineResult<bool> {
    ensure_tables(pool, database, &[OLYMPUS.name], &[CREATE_OLYMPUS]).await
}

/// Create the FilmArray tables when any of them is missing.
pub async fn ensure_film_array_tables(pool: &MySqlPool, database: &str) -> PipelineResult<bool> {
    ensure_tables(
        pool,
        database,
        &[FILM_ARRAY_TEST.name, RESULT_GROUP.name, RESULT.name],
        // Parents first so the foreign keys resolve
        &[CREATE_FILM_ARRAY_TEST, CREATE_RESULT_GROUP, CREATE_RESULT],
    )
    .await
}

async fn ensure_tables(
    pool: &MySqlPool,
    database: &str,
    tables: &[&str],
    ddl: &[&str],
) -> PipelineResult<bool> {
    if tables_exist(pool, database, tables).await? {
        return Ok(false);
    }

    info!(tables = ?tables, "No tables, creating");

    for statement in ddl {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(tables = ?tables, "Tables created");

    Ok(true)
}
