use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::config::{DatabaseConfig, DATABASE_CHARSET};
use crate::error::{PipelineError, PipelineResult};

pub mod schema;

/// Open the invocation's database handle.
///
/// The pool holds a single connection: every statement of an invocation runs
/// on it, one after another. Failure to connect within the configured timeout
/// is reported as [`PipelineError::Connection`].
pub async fn connect(config: &DatabaseConfig) -> PipelineResult<MySqlPool> {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.name)
        .charset(DATABASE_CHARSET);

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
        .map_err(PipelineError::Connection)?;

    info!(
        host = %config.host,
        database = %config.name,
        "Connection to MySQL instance succeeded"
    );

    Ok(pool)
}

/// Whether `table` exists in `database`
pub async fn table_exists(pool: &MySqlPool, database: &str, table: &str) -> PipelineResult<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM information_schema.tables
        WHERE table_schema = ? AND table_name = ?
        "#,
    )
    .bind(database)
    .bind(table)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Whether every table in `tables` exists in `database`
pub async fn tables_exist(
    pool: &MySqlPool,
    database: &str,
    tables: &[&str],
) -> PipelineResult<bool> {
    for table in tables {
        if !table_exists(pool, database, table).await? {
            return Ok(false);
        }
    }
    Ok(true)
}
