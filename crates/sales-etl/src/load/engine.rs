//! Full SQL engine writer over sqlx's `Any` driver.
//!
//! One code path serves SQLite, PostgreSQL and MySQL; the dialect comes from
//! the connection URL and shapes every generated statement.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyPoolOptions};
use sqlx::query::Query;
use sqlx::{Any, AnyPool};
use tracing::{debug, info};

use super::dialect::{normalize_url, redact_url, Dialect};
use super::{ExistsPolicy, TableWriter, WriteTarget};
use crate::core::value::DATETIME_FORMAT;
use crate::core::{ColumnType, Table, Value};
use crate::error::{EtlError, Result};

/// How long to wait for the first connection before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine-backed writer holding a single-connection pool.
pub struct EngineWriter {
    pool: AnyPool,
    dialect: Dialect,
}

impl EngineWriter {
    /// Connect and verify the connection with a trivial query.
    pub async fn connect(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let url = normalize_url(url);
        let dialect = Dialect::from_url(&url)?;

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(&url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        info!(
            "Connected to {} engine: {}",
            dialect.name(),
            redact_url(&url)
        );
        Ok(Self { pool, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(self.dialect.table_exists_sql())
            .bind(name.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl TableWriter for EngineWriter {
    fn backend(&self) -> &'static str {
        "engine"
    }

    async fn write(&self, table: &Table, target: &WriteTarget) -> Result<u64> {
        let dialect = self.dialect;
        let name = target.table.as_str();
        let exists = self.table_exists(name).await?;

        if exists && target.if_exists == ExistsPolicy::Fail {
            return Err(EtlError::TableExists(name.to_string()));
        }

        let drop_sql = dialect.drop_table_sql(name)?;
        let create_sql = dialect.create_table_sql(name, &table.columns)?;
        let insert_sql = dialect.insert_sql(name, &table.columns)?;

        let mut tx = self.pool.begin().await?;
        if exists && target.if_exists == ExistsPolicy::Replace {
            sqlx::query(&drop_sql).execute(&mut *tx).await?;
        }
        if !exists || target.if_exists == ExistsPolicy::Replace {
            sqlx::query(&create_sql).execute(&mut *tx).await?;
        }

        let mut written = 0u64;
        for row in &table.rows {
            let mut query = sqlx::query(&insert_sql);
            for (value, column) in row.iter().zip(&table.columns) {
                query = bind_value(query, value, column.column_type);
            }
            query.execute(&mut *tx).await?;
            written += 1;
        }
        tx.commit().await?;

        debug!("Engine write committed {} rows into {}", written, name);
        Ok(written)
    }

    async fn row_count(&self, name: &str) -> Result<u64> {
        let sql = self.dialect.count_rows_sql(name)?;
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        debug!("Closed {} engine pool", self.dialect.name());
        Ok(())
    }
}

/// Bind a cell using the column's declared type; dates travel as text.
fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &Value,
    column_type: ColumnType,
) -> Query<'q, Any, AnyArguments<'q>> {
    match column_type {
        ColumnType::Int => query.bind(match value {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }),
        ColumnType::Float => query.bind(value.as_f64()),
        ColumnType::Text => query.bind((!value.is_null()).then(|| value.to_text())),
        ColumnType::Date => query.bind(match value {
            Value::Date(d) => Some(d.format(DATETIME_FORMAT).to_string()),
            _ => None,
        }),
    }
}
