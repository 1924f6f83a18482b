//! Embedded SQLite writer backed by rusqlite.
//!
//! Always available; used directly for file destinations when the full SQL
//! engine cannot be initialized, and for reading tables back.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use super::dialect::Dialect;
use super::{ExistsPolicy, TableWriter, WriteTarget};
use crate::core::value::{parse_date, DATETIME_FORMAT};
use crate::core::{Column, ColumnType, Table, Value};
use crate::error::{EtlError, Result};

/// Writer over a single SQLite file.
pub struct EmbeddedWriter {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl EmbeddedWriter {
    /// Open (creating if needed) the SQLite file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        info!("Opened embedded SQLite database: {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| {
                EtlError::write(self.path.display().to_string(), "connection lock poisoned")
            })?;
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(EtlError::write(
                self.path.display().to_string(),
                "connection already closed",
            )),
        }
    }

    /// Read a whole table back, typing columns from their declared SQL types.
    pub fn read_table(&self, name: &str) -> Result<Table> {
        self.with_conn(|conn| read_table(conn, name))
    }

    pub fn row_count(&self, name: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let sql = Dialect::Sqlite.count_rows_sql(name)?;
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| table_exists(conn, name))
    }
}

#[async_trait]
impl TableWriter for EmbeddedWriter {
    fn backend(&self) -> &'static str {
        "embedded"
    }

    async fn write(&self, table: &Table, target: &WriteTarget) -> Result<u64> {
        self.with_conn(|conn| write_table(conn, table, target))
    }

    async fn row_count(&self, name: &str) -> Result<u64> {
        EmbeddedWriter::row_count(self, name)
    }

    async fn close(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| {
                EtlError::write(self.path.display().to_string(), "connection lock poisoned")
            })?
            .take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| EtlError::Embedded(e))?;
            debug!("Closed embedded database {}", self.path.display());
        }
        Ok(())
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(Dialect::Sqlite.table_exists_sql(), [name], |row| row.get(0))?;
    Ok(count > 0)
}

fn write_table(conn: &mut Connection, table: &Table, target: &WriteTarget) -> Result<u64> {
    let dialect = Dialect::Sqlite;
    let name = target.table.as_str();
    let exists = table_exists(conn, name)?;

    if exists && target.if_exists == ExistsPolicy::Fail {
        return Err(EtlError::TableExists(name.to_string()));
    }

    let tx = conn.transaction()?;
    if exists && target.if_exists == ExistsPolicy::Replace {
        tx.execute(&dialect.drop_table_sql(name)?, [])?;
    }
    if !exists || target.if_exists == ExistsPolicy::Replace {
        tx.execute(&dialect.create_table_sql(name, &table.columns)?, [])?;
    }

    let mut written = 0u64;
    {
        let mut stmt = tx.prepare(&dialect.insert_sql(name, &table.columns)?)?;
        for row in &table.rows {
            stmt.execute(params_from_iter(row.iter().map(to_sql)))?;
            written += 1;
        }
    }
    tx.commit()?;

    debug!("Embedded write committed {} rows into {}", written, name);
    Ok(written)
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Int(v) => SqlValue::Integer(*v),
        Value::Float(v) => SqlValue::Real(*v),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Date(d) => SqlValue::Text(d.format(DATETIME_FORMAT).to_string()),
    }
}

/// Map a declared SQLite column type back onto the table model.
fn declared_type(decl: &str) -> ColumnType {
    let decl = decl.to_uppercase();
    if decl.contains("INT") {
        ColumnType::Int
    } else if decl.contains("REAL") || decl.contains("DOUB") || decl.contains("FLOA") {
        ColumnType::Float
    } else if decl.contains("DATE") || decl.contains("TIME") {
        ColumnType::Date
    } else {
        ColumnType::Text
    }
}

fn from_sql(value: ValueRef<'_>, column_type: ColumnType) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => match column_type {
            ColumnType::Float => Value::Float(v as f64),
            _ => Value::Int(v),
        },
        ValueRef::Real(v) => Value::float(v),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            match column_type {
                ColumnType::Date => parse_date(&text)
                    .map(Value::Date)
                    .unwrap_or_else(|| Value::Text(text.into_owned())),
                _ => Value::Text(text.into_owned()),
            }
        }
    }
}

fn read_table(conn: &Connection, name: &str) -> Result<Table> {
    if !table_exists(conn, name)? {
        return Err(EtlError::write(name, "table does not exist"));
    }
    let quoted = Dialect::Sqlite.quote_ident(name)?;

    let mut info = conn.prepare(&format!("PRAGMA table_info({})", quoted))?;
    let columns = info
        .query_map([], |row| {
            let col: String = row.get(1)?;
            let decl: String = row.get(2)?;
            Ok(Column::new(col, declared_type(&decl)))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", quoted))?;
    let mut rows = stmt.query([])?;
    let mut table = Table::new(columns);
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(table.columns.len());
        for (i, col) in table.columns.iter().enumerate() {
            values.push(from_sql(row.get_ref(i)?, col.column_type));
        }
        table.rows.push(values);
    }
    Ok(table)
}
