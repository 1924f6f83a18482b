//! Load stage: persist a [`Table`] into a SQL destination.
//!
//! Two interchangeable writers implement [`TableWriter`]:
//!
//! - [`EngineWriter`](engine::EngineWriter): the full SQL engine (sqlx `Any`),
//!   compiled in with the `engine` feature, covering SQLite, PostgreSQL and
//!   MySQL URLs
//! - [`EmbeddedWriter`]: a rusqlite connection to a local SQLite file
//!
//! [`select_writer`] makes the choice once per run. File destinations prefer
//! the engine and fall back to the embedded writer when the engine cannot be
//! initialized; URL destinations require the engine.

pub mod dialect;
pub mod embedded;
#[cfg(feature = "engine")]
pub mod engine;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::Table;
use crate::error::{EtlError, Result};

pub use embedded::EmbeddedWriter;
#[cfg(feature = "engine")]
pub use engine::EngineWriter;

/// What to do when the destination table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistsPolicy {
    /// Refuse to write; the destination is left untouched.
    Fail,
    /// Drop and recreate the table, then insert.
    #[default]
    Replace,
    /// Insert after any existing rows, creating the table if missing.
    Append,
}

impl ExistsPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExistsPolicy::Fail => "fail",
            ExistsPolicy::Replace => "replace",
            ExistsPolicy::Append => "append",
        }
    }
}

impl fmt::Display for ExistsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExistsPolicy {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(ExistsPolicy::Fail),
            "replace" => Ok(ExistsPolicy::Replace),
            "append" => Ok(ExistsPolicy::Append),
            other => Err(EtlError::Config(format!(
                "Invalid if-exists policy '{}': expected fail, replace or append",
                other
            ))),
        }
    }
}

/// Destination table and conflict policy for one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    pub table: String,
    pub if_exists: ExistsPolicy,
}

impl WriteTarget {
    pub fn new(table: impl Into<String>, if_exists: ExistsPolicy) -> Self {
        Self {
            table: table.into(),
            if_exists,
        }
    }
}

/// Where a table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Local SQLite file.
    Embedded { path: PathBuf },
    /// Database URL handled by the full engine.
    Url { url: String },
}

impl Destination {
    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        Destination::Embedded { path: path.into() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Destination::Url { url: url.into() }
    }

    /// Human-readable form with credentials removed.
    pub fn describe(&self) -> String {
        match self {
            Destination::Embedded { path } => path.display().to_string(),
            Destination::Url { url } => dialect::redact_url(url),
        }
    }
}

/// Why a file destination is served by the embedded writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Built without the `engine` feature.
    EngineUnavailable,
    /// The engine is present but could not open the destination.
    InitFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::EngineUnavailable => f.write_str("full SQL engine not compiled in"),
            FallbackReason::InitFailed(cause) => {
                write!(f, "full SQL engine failed to initialize: {}", cause)
            }
        }
    }
}

/// Write a table into a SQL destination.
///
/// `write` either applies the whole table or leaves the destination as it
/// was: policies are checked before anything is mutated and all statements
/// for one write run in a single transaction.
#[async_trait]
pub trait TableWriter: Send + Sync {
    /// Short backend name for logs and summaries.
    fn backend(&self) -> &'static str;

    /// Write all rows of `table` into `target`, returning rows written.
    async fn write(&self, table: &Table, target: &WriteTarget) -> Result<u64>;

    /// Number of rows currently in `table`.
    async fn row_count(&self, table: &str) -> Result<u64>;

    /// Release the connection. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Writer chosen by [`select_writer`].
///
/// Dispatch is a plain match; the set of backends is closed.
pub enum WriterImpl {
    #[cfg(feature = "engine")]
    Engine(EngineWriter),
    Embedded(EmbeddedWriter),
}

#[async_trait]
impl TableWriter for WriterImpl {
    fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "engine")]
            WriterImpl::Engine(w) => w.backend(),
            WriterImpl::Embedded(w) => w.backend(),
        }
    }

    async fn write(&self, table: &Table, target: &WriteTarget) -> Result<u64> {
        match self {
            #[cfg(feature = "engine")]
            WriterImpl::Engine(w) => w.write(table, target).await,
            WriterImpl::Embedded(w) => w.write(table, target).await,
        }
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        match self {
            #[cfg(feature = "engine")]
            WriterImpl::Engine(w) => TableWriter::row_count(w, table).await,
            WriterImpl::Embedded(w) => TableWriter::row_count(w, table).await,
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            #[cfg(feature = "engine")]
            WriterImpl::Engine(w) => w.close().await,
            WriterImpl::Embedded(w) => w.close().await,
        }
    }
}

/// Choose the writer for `destination`.
pub async fn select_writer(destination: &Destination) -> Result<WriterImpl> {
    match destination {
        Destination::Embedded { path } => match try_engine(&sqlite_url(path)).await {
            Ok(writer) => Ok(writer),
            Err(reason) => {
                warn!(
                    "Falling back to embedded SQLite for {}: {}",
                    path.display(),
                    reason
                );
                Ok(WriterImpl::Embedded(EmbeddedWriter::open(path)?))
            }
        },
        Destination::Url { url } => connect_url(url).await,
    }
}

/// Engine URL for a local SQLite file, created on first use.
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

#[cfg(feature = "engine")]
async fn try_engine(url: &str) -> std::result::Result<WriterImpl, FallbackReason> {
    EngineWriter::connect(url)
        .await
        .map(WriterImpl::Engine)
        .map_err(|e| FallbackReason::InitFailed(e.to_string()))
}

#[cfg(not(feature = "engine"))]
async fn try_engine(_url: &str) -> std::result::Result<WriterImpl, FallbackReason> {
    Err(FallbackReason::EngineUnavailable)
}

#[cfg(feature = "engine")]
async fn connect_url(url: &str) -> Result<WriterImpl> {
    let writer = EngineWriter::connect(url).await?;
    info!("Writing through the full SQL engine");
    Ok(WriterImpl::Engine(writer))
}

#[cfg(not(feature = "engine"))]
async fn connect_url(url: &str) -> Result<WriterImpl> {
    Err(EtlError::Config(format!(
        "{} requires the full SQL engine, which this build does not include",
        dialect::redact_url(url)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, ColumnType, Value};
    use tempfile::TempDir;

    fn table() -> Table {
        Table::with_rows(
            vec![Column::new("id", ColumnType::Int)],
            vec![vec![Value::Int(1)]],
        )
        .unwrap()
    }

    #[test]
    fn test_exists_policy_parse() {
        assert_eq!("fail".parse::<ExistsPolicy>().unwrap(), ExistsPolicy::Fail);
        assert_eq!("REPLACE".parse::<ExistsPolicy>().unwrap(), ExistsPolicy::Replace);
        assert_eq!("append".parse::<ExistsPolicy>().unwrap(), ExistsPolicy::Append);
        assert!("upsert".parse::<ExistsPolicy>().is_err());
        assert_eq!(ExistsPolicy::default(), ExistsPolicy::Replace);
        assert_eq!(ExistsPolicy::Append.to_string(), "append");
    }

    #[test]
    fn test_destination_describe_redacts() {
        let dest = Destination::url("postgres://etl:pw@db/etl");
        assert_eq!(dest.describe(), "postgres://etl:***@db/etl");
        assert_eq!(Destination::embedded("sales.db").describe(), "sales.db");
    }

    #[test]
    fn test_fallback_reason_display() {
        assert!(FallbackReason::EngineUnavailable
            .to_string()
            .contains("not compiled in"));
        assert!(FallbackReason::InitFailed("boom".into())
            .to_string()
            .ends_with("boom"));
    }

    #[tokio::test]
    async fn test_select_writer_for_file_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sales.db");
        let writer = select_writer(&Destination::embedded(&path)).await.unwrap();

        #[cfg(feature = "engine")]
        assert_eq!(writer.backend(), "engine");
        #[cfg(not(feature = "engine"))]
        assert_eq!(writer.backend(), "embedded");

        let target = WriteTarget::new("t", ExistsPolicy::Replace);
        assert_eq!(writer.write(&table(), &target).await.unwrap(), 1);
        assert_eq!(writer.row_count("t").await.unwrap(), 1);
        writer.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_select_writer_url_failure_is_error() {
        let err = select_writer(&Destination::url("postgres://u:p@127.0.0.1:1/db"))
            .await
            .err()
            .unwrap();
        #[cfg(feature = "engine")]
        assert!(matches!(err, EtlError::Engine(_)));
        #[cfg(not(feature = "engine"))]
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[cfg(feature = "engine")]
    #[tokio::test]
    async fn test_engine_init_failure_reason() {
        let dir = TempDir::new().unwrap();
        let missing_parent = dir.path().join("missing").join("sales.db");
        let reason = try_engine(&sqlite_url(&missing_parent)).await.err().unwrap();
        assert!(matches!(reason, FallbackReason::InitFailed(_)));
    }
}
