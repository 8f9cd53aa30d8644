//! Row loading
//!
//! Parsed rows reach the database through [`RowSink`]. [`BatchLoader`] drains a
//! batched row stream into one table, committing each batch on its own; there
//! is no transaction spanning batches, so batches committed before a failure
//! stay committed. FilmArray trees go through [`film_array::persist_run`].

use async_trait::async_trait;
use tracing::info;

use crate::db::schema::Table;
use crate::error::PipelineResult;
use crate::parser::ParseError;

pub mod film_array;
pub mod mysql;
pub mod rows;

pub use mysql::MySqlSink;

/// A bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    /// Generated id of a parent row
    Id(u64),
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        Self::Id(value)
    }
}

/// Values for one insert, in the table's column order.
pub type Row = Vec<SqlValue>;

/// A parsed record that maps onto one row of a fixed table.
pub trait TableRow {
    const TABLE: Table;

    fn into_row(self) -> Row;
}

/// Destination for rows.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Insert and commit one row, returning its generated id.
    async fn insert_one(&self, table: &Table, row: Row) -> PipelineResult<u64>;

    /// Insert and commit `rows` as one unit, returning the number inserted.
    async fn insert_batch(&self, table: &Table, rows: Vec<Row>) -> PipelineResult<u64>;
}

/// Totals for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub batches: usize,
    pub rows: u64,
}

impl std::ops::AddAssign for LoadStats {
    fn add_assign(&mut self, other: Self) {
        self.batches += other.batches;
        self.rows += other.rows;
    }
}

/// Loads a batched row stream into the table of `T`.
pub struct BatchLoader<'a> {
    sink: &'a dyn RowSink,
}

impl<'a> BatchLoader<'a> {
    pub fn new(sink: &'a dyn RowSink) -> Self {
        Self { sink }
    }

    /// Insert every batch in order. A parse error or a failed insert stops the
    /// load; earlier batches remain committed.
    pub async fn load<T, I>(&self, batches: I) -> PipelineResult<LoadStats>
    where
        T: TableRow,
        I: IntoIterator<Item = Result<Vec<T>, ParseError>>,
    {
        let mut stats = LoadStats::default();

        for batch in batches {
            let rows: Vec<Row> = batch?.into_iter().map(TableRow::into_row).collect();
            let inserted = self.sink.insert_batch(&T::TABLE, rows).await?;

            stats.batches += 1;
            stats.rows += inserted;

            info!(
                table = T::TABLE.name,
                batch = stats.batches,
                rows = inserted,
                "Committed batch"
            );
        }

        Ok(stats)
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::testing::MemorySink;
    use super::*;
    use crate::parser::sciex::SciexRow;
    use crate::parser::BatchExt;

    fn sciex_rows(n: usize) -> impl Iterator<Item = Result<SciexRow, ParseError>> {
        (0..n).map(|i| {
            Ok(SciexRow {
                sample_name: format!("S-{}", i),
                component_name: "Morphine".to_string(),
                actual_concentration: "1".to_string(),
                calculated_concentration: "1.1".to_string(),
            })
        })
    }

    #[tokio::test]
    async fn test_load_commits_each_batch() {
        let sink = MemorySink::default();
        let stats = BatchLoader::new(&sink)
            .load(sciex_rows(7).batches(3))
            .await
            .unwrap();

        assert_eq!(stats, LoadStats { batches: 3, rows: 7 });
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![3, 3, 1]);
        assert_eq!(sink.rows("sciex").len(), 7);
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_earlier_batches() {
        let sink = MemorySink {
            fail_batch: Some(1),
            ..Default::default()
        };
        let result = BatchLoader::new(&sink).load(sciex_rows(7).batches(3)).await;

        assert!(result.is_err());
        assert_eq!(sink.rows("sciex").len(), 3);
        assert_eq!(sink.batch_sizes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_parse_error_stops_load() {
        let input = sciex_rows(4)
            .chain(std::iter::once(Err(ParseError::MalformedHeader { fields: 2 })))
            .chain(sciex_rows(4));
        let sink = MemorySink::default();
        let result = BatchLoader::new(&sink).load(input.batches(3)).await;

        assert!(matches!(result, Err(crate::error::PipelineError::Parse(_))));
        assert_eq!(sink.rows("sciex").len(), 3);
    }
}
