//! SQL text generation per destination database.
//!
//! The writer derives the destination schema from the in-memory table, so all
//! DDL and DML comes from here: identifier quoting, column types, parameter
//! placeholders and the catalog query used to test for an existing table.

use crate::core::identifier::{quote_ansi, quote_mysql};
use crate::core::{Column, ColumnType};
use crate::error::{EtlError, Result};

/// Destination SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    Mysql,
}

impl Dialect {
    /// Derive the dialect from a connection URL's scheme.
    ///
    /// SQLAlchemy-style schemes with a driver suffix (`postgresql+psycopg2`)
    /// are accepted; the suffix is ignored.
    pub fn from_url(url: &str) -> Result<Self> {
        match url_scheme(url).as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            other => Err(EtlError::Config(format!(
                "Unsupported database URL scheme '{}'",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
        }
    }

    pub fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            Dialect::Mysql => quote_mysql(name),
            Dialect::Sqlite | Dialect::Postgres => quote_ansi(name),
        }
    }

    /// Column type used in generated `CREATE TABLE` statements.
    pub fn column_type(&self, column_type: ColumnType) -> &'static str {
        match (self, column_type) {
            (Dialect::Sqlite, ColumnType::Int) => "INTEGER",
            (Dialect::Sqlite, ColumnType::Float) => "REAL",
            (Dialect::Sqlite, ColumnType::Date) => "TIMESTAMP",
            (Dialect::Postgres, ColumnType::Int) => "BIGINT",
            (Dialect::Postgres, ColumnType::Float) => "DOUBLE PRECISION",
            (Dialect::Postgres, ColumnType::Date) => "TIMESTAMP",
            (Dialect::Mysql, ColumnType::Int) => "BIGINT",
            (Dialect::Mysql, ColumnType::Float) => "DOUBLE",
            (Dialect::Mysql, ColumnType::Date) => "DATETIME",
            (_, ColumnType::Text) => "TEXT",
        }
    }

    /// Placeholder for the 1-based parameter `idx`.
    ///
    /// Dates are bound as text, so typed dialects cast them back.
    pub fn placeholder(&self, idx: usize, column_type: ColumnType) -> String {
        match (self, column_type) {
            (Dialect::Sqlite, _) => "?".to_string(),
            (Dialect::Postgres, ColumnType::Date) => format!("CAST(${} AS TIMESTAMP)", idx),
            (Dialect::Postgres, _) => format!("${}", idx),
            (Dialect::Mysql, ColumnType::Date) => "CAST(? AS DATETIME)".to_string(),
            (Dialect::Mysql, _) => "?".to_string(),
        }
    }

    pub fn create_table_sql(&self, table: &str, columns: &[Column]) -> Result<String> {
        if columns.is_empty() {
            return Err(EtlError::write(table, "cannot create a table with no columns"));
        }
        let defs = columns
            .iter()
            .map(|c| {
                Ok(format!(
                    "{} {}",
                    self.quote_ident(&c.name)?,
                    self.column_type(c.column_type)
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "CREATE TABLE {} ({})",
            self.quote_ident(table)?,
            defs.join(", ")
        ))
    }

    pub fn drop_table_sql(&self, table: &str) -> Result<String> {
        Ok(format!("DROP TABLE IF EXISTS {}", self.quote_ident(table)?))
    }

    pub fn insert_sql(&self, table: &str, columns: &[Column]) -> Result<String> {
        let names = columns
            .iter()
            .map(|c| self.quote_ident(&c.name))
            .collect::<Result<Vec<_>>>()?;
        let params: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| self.placeholder(i + 1, c.column_type))
            .collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(table)?,
            names.join(", "),
            params.join(", ")
        ))
    }

    /// Catalog query returning the number of tables named by parameter 1.
    pub fn table_exists_sql(&self) -> &'static str {
        match self {
            Dialect::Sqlite => {
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?"
            }
            Dialect::Postgres => {
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1"
            }
            Dialect::Mysql => {
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = ?"
            }
        }
    }

    pub fn count_rows_sql(&self, table: &str) -> Result<String> {
        Ok(format!("SELECT COUNT(*) FROM {}", self.quote_ident(table)?))
    }
}

/// Scheme of a connection URL without any `+driver` suffix, lowercased.
pub fn url_scheme(url: &str) -> String {
    url.split(':')
        .next()
        .unwrap_or_default()
        .split('+')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Strip a SQLAlchemy `+driver` suffix from the scheme so the URL is usable
/// by the engine: `postgresql+psycopg2://...` → `postgresql://...`.
pub fn normalize_url(url: &str) -> String {
    match url.split_once(':') {
        Some((scheme, rest)) if scheme.contains('+') => format!("{}:{}", url_scheme(url), rest),
        _ => url.to_string(),
    }
}

/// Connection URL with any password replaced, for logs.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}
