use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use super::{Row, RowSink, SqlValue};
use crate::db::schema::Table;
use crate::error::PipelineResult;

/// Placeholders MySQL accepts in one prepared statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// [`RowSink`] writing through the invocation's MySQL pool.
#[derive(Clone)]
pub struct MySqlSink {
    pool: MySqlPool,
}

impl MySqlSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Rows that fit in one statement for `table`.
    pub fn rows_per_statement(table: &Table) -> usize {
        (MAX_BIND_PARAMS / table.columns.len().max(1)).max(1)
    }

    fn insert_statement<'q>(table: &Table, rows: &'q [Row]) -> QueryBuilder<'q, MySql> {
        let mut query_builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            table.name,
            table.columns.join(", ")
        ));

        query_builder.push_values(rows, |mut b, row| {
            for value in row {
                match value {
                    SqlValue::Text(text) => b.push_bind(text.as_str()),
                    SqlValue::Id(id) => b.push_bind(*id),
                };
            }
        });

        query_builder
    }
}

#[async_trait]
impl RowSink for MySqlSink {
    async fn insert_one(&self, table: &Table, row: Row) -> PipelineResult<u64> {
        let rows = [row];
        let result = Self::insert_statement(table, &rows)
            .build()
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_id())
    }

    async fn insert_batch(&self, table: &Table, rows: Vec<Row>) -> PipelineResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let chunk_size = Self::rows_per_statement(table);
        let total_chunks = rows.len().div_ceil(chunk_size);
        let mut inserted = 0;

        let mut tx = self.pool.begin().await?;

        for (chunk_idx, chunk) in rows.chunks(chunk_size).enumerate() {
            debug!(
                "Inserting {} chunk {} / {} ({} rows)",
                table.name,
                chunk_idx + 1,
                total_chunks,
                chunk.len()
            );

            let result = Self::insert_statement(table, chunk)
                .build()
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(inserted)
    }
}
