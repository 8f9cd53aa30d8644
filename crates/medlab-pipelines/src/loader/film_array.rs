//! Top-down persistence of a FilmArray tree.
//!
//! The test row is inserted first; its generated id goes into every group
//! row, and each group's generated id goes into that group's result rows.
//! Every insert commits before the next starts, so a child never references an
//! uncommitted parent.

use tracing::{debug, info};

use super::rows::{result_group_row, result_row};
use super::{LoadStats, RowSink, TableRow};
use crate::db::schema;
use crate::error::PipelineResult;
use crate::parser::film_array::FilmArrayRun;

pub async fn persist_run(sink: &dyn RowSink, run: FilmArrayRun) -> PipelineResult<LoadStats> {
    let FilmArrayRun { test, groups } = run;
    let mut stats = LoadStats::default();

    let test_id = sink.insert_one(&schema::FILM_ARRAY_TEST, test.into_row()).await?;
    stats.rows += 1;
    info!(test_id, "filmArrayTest is written");

    for node in &groups {
        let group_id = sink
            .insert_one(&schema::RESULT_GROUP, result_group_row(&node.group, test_id))
            .await?;
        stats.rows += 1;

        if !node.results.is_empty() {
            let rows = node
                .results
                .iter()
                .map(|result| result_row(result, group_id))
                .collect();
            stats.rows += sink.insert_batch(&schema::RESULT, rows).await?;
            stats.batches += 1;
        }

        debug!(
            group_id,
            code = %node.group.code,
            results = node.results.len(),
            "resultGroup is written"
        );
    }

    info!(test_id, groups = groups.len(), "resultGroup and result rows are written");

    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::loader::testing::MemorySink;
    use crate::loader::SqlValue;
    use crate::parser::film_array::{GroupNode, ResultGroupRecord, ResultRecord, TestRecord};

    fn test_record() -> TestRecord {
        let s = |v: &str| v.to_string();
        TestRecord {
            specimen_identifier: s("ACC-42"),
            test_identifier: s("RP2.1"),
            test_name: s("Respiratory Panel"),
            test_version: s("2.1"),
            instrument_type: s("Torch"),
            instrument_serial_number: s("TM-0001"),
            disposable_identifier: s("D-9"),
            disposable_reference: s("423742"),
            disposable_type: s("Pouch"),
            disposable_lot_number: s("L-77"),
            sender_name: s("FilmArray Torch"),
            processing_identifier: s("P"),
            version: s("1.0"),
            date_time: s("20240301120000"),
            message_type: s("ORU"),
            request_status: s("F"),
        }
    }

    fn node(code: &str, results: usize) -> GroupNode {
        GroupNode {
            group: ResultGroupRecord {
                code: code.to_string(),
                name: format!("{} group", code),
                coding_system: "L".to_string(),
            },
            results: (0..results)
                .map(|i| ResultRecord {
                    test_code: format!("{}-{}", code, i),
                    test_name: "Target".to_string(),
                    coding_system: "LN".to_string(),
                    value_type: "ST".to_string(),
                    observation_value: "Not Detected".to_string(),
                    observation_name: "Detection".to_string(),
                    operator_name: "jdoe".to_string(),
                    result_date_time: "20240301115500".to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_cascade_threads_generated_ids() {
        let sink = MemorySink::default();
        let run = FilmArrayRun {
            test: test_record(),
            groups: vec![node("VIR", 2), node("EMPTY", 0), node("BAC", 1)],
        };

        let stats = persist_run(&sink, run).await.unwrap();
        assert_eq!(stats.rows, 1 + 3 + 3);
        assert_eq!(stats.batches, 2);

        let tests = sink.rows("filmArrayTest");
        let groups = sink.rows("resultGroup");
        let results = sink.rows("result");
        assert_eq!(tests.len(), 1);
        assert_eq!(groups.len(), 3);
        assert_eq!(results.len(), 3);

        for group in &groups {
            assert_eq!(group.row.last(), Some(&SqlValue::Id(tests[0].id)));
            assert!(group.id > tests[0].id);
        }

        for result in &results {
            let Some(SqlValue::Id(parent)) = result.row.last() else {
                panic!("result row without parent id: {:?}", result.row);
            };
            let owner = groups.iter().find(|g| g.id == *parent).unwrap();
            assert!(owner.id < result.id, "group must be committed before its results");
        }

        // VIR results point at the VIR group, BAC at BAC
        assert_eq!(results[0].row.last(), Some(&SqlValue::Id(groups[0].id)));
        assert_eq!(results[2].row.last(), Some(&SqlValue::Id(groups[2].id)));
    }

    #[tokio::test]
    async fn test_run_without_groups_writes_only_the_test() {
        let sink = MemorySink::default();
        let run = FilmArrayRun {
            test: test_record(),
            groups: Vec::new(),
        };

        let stats = persist_run(&sink, run).await.unwrap();
        assert_eq!(stats, LoadStats { batches: 0, rows: 1 });
        assert!(sink.rows("resultGroup").is_empty());
    }
}
