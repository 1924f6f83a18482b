//! Job orchestration.
//!
//! One function per job, each running extract → transform → load in order
//! and returning a serializable summary. Writers are opened right before the
//! write and always closed afterwards, whether or not the write succeeded.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, DB_ENV_VARS};
use crate::core::{ColumnType, Table, Value};
use crate::error::{EtlError, Result};
use crate::extract::remote::{probe_endpoint, EndpointStatus};
use crate::extract::{fetch_rates, load_csv, write_csv, LoadOptions, RateSource};
use crate::load::{select_writer, Destination, ExistsPolicy, TableWriter, WriteTarget};
use crate::transform::{add_total_sales, clean_sales, filter_eq, group_sum, rates_table};

/// Rows echoed to the log after loading.
const PREVIEW_ROWS: usize = 5;

/// Which backend a load should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTo {
    /// Local SQLite file, engine first with embedded fallback.
    Sqlite,
    /// Database URL through the full engine.
    Engine,
}

impl std::str::FromStr for LoadTo {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(LoadTo::Sqlite),
            "engine" | "sqlalchemy" => Ok(LoadTo::Engine),
            other => Err(EtlError::Config(format!(
                "Invalid destination '{}': expected sqlite or engine (alias sqlalchemy)",
                other
            ))),
        }
    }
}

/// Resolve a `--to` choice into a destination.
///
/// `Engine` uses `conn`, else the configured `DB_URL`; with neither it fails
/// with [`EtlError::MissingConnection`].
pub fn resolve_destination(
    to: LoadTo,
    db_path: &Path,
    conn: Option<&str>,
    config: &Config,
) -> Result<Destination> {
    match to {
        LoadTo::Sqlite => Ok(Destination::embedded(db_path)),
        LoadTo::Engine => conn
            .map(str::to_string)
            .or_else(|| config.database.url.clone())
            .filter(|url| !url.trim().is_empty())
            .map(Destination::url)
            .ok_or_else(|| {
                EtlError::MissingConnection(
                    "--to engine needs --conn <url> or DB_URL in the environment".into(),
                )
            }),
    }
}

/// A destination plus the table written there.
#[derive(Debug, Clone)]
pub struct Sink {
    pub destination: Destination,
    pub target: WriteTarget,
}

impl Sink {
    pub fn new(destination: Destination, target: WriteTarget) -> Self {
        Self {
            destination,
            target,
        }
    }
}

/// Rows written and backend used by [`write_table`].
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub rows_written: u64,
    pub backend: &'static str,
    pub table: String,
    pub destination: String,
}

/// Select a writer, write `table` and close the writer.
///
/// The writer is closed even when the write fails; the write error wins.
pub async fn write_table(table: &Table, sink: &Sink) -> Result<WriteOutcome> {
    let writer = select_writer(&sink.destination).await?;
    let backend = writer.backend();
    info!(
        "Writing {} rows to {} ({}, if-exists={}) via {}",
        table.len(),
        sink.target.table,
        sink.destination.describe(),
        sink.target.if_exists,
        backend
    );

    let written = writer.write(table, &sink.target).await;
    let closed = writer.close().await;
    let rows_written = written?;
    closed?;

    Ok(WriteOutcome {
        rows_written,
        backend,
        table: sink.target.table.clone(),
        destination: sink.destination.describe(),
    })
}

fn elapsed_seconds(started_at: DateTime<Utc>) -> f64 {
    (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0
}

// =============================================================================
// load
// =============================================================================

/// Load an order export into a database table.
#[derive(Debug, Clone)]
pub struct LoadJob {
    pub csv: PathBuf,
    pub options: LoadOptions,
}

impl LoadJob {
    /// Order export with the standard coercion rules.
    pub fn orders(csv: impl Into<PathBuf>) -> Self {
        Self {
            csv: csv.into(),
            options: LoadOptions::sales_orders(),
        }
    }

    /// Read and coerce the input. Nothing is opened for writing yet, so a
    /// destination can be resolved after this succeeds.
    pub fn extract(self) -> Result<LoadedCsv> {
        let started_at = Utc::now();

        info!("Phase 1: Loading {}", self.csv.display());
        let table = load_csv(&self.csv, &self.options)?;
        info!("Preview:\n{}", table.render_preview(PREVIEW_ROWS));

        Ok(LoadedCsv {
            input: self.csv,
            table,
            started_at,
        })
    }
}

/// An input file loaded by [`LoadJob::extract`], waiting to be written.
#[derive(Debug, Clone)]
pub struct LoadedCsv {
    pub input: PathBuf,
    pub table: Table,
    started_at: DateTime<Utc>,
}

impl LoadedCsv {
    pub async fn write(self, sink: &Sink) -> Result<LoadSummary> {
        info!("Phase 2: Writing to {}", sink.destination.describe());
        let outcome = write_table(&self.table, sink).await?;

        info!(
            "Loaded {} rows into '{}' ({})",
            outcome.rows_written, outcome.table, outcome.backend
        );
        Ok(LoadSummary {
            input: self.input.display().to_string(),
            rows_loaded: self.table.len(),
            rows_written: outcome.rows_written,
            backend: outcome.backend,
            table: outcome.table,
            destination: outcome.destination,
            started_at: self.started_at,
            duration_seconds: elapsed_seconds(self.started_at),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub input: String,
    pub rows_loaded: usize,
    pub rows_written: u64,
    pub backend: &'static str,
    pub table: String,
    pub destination: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl LoadSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Extract `job` and write it to `sink`.
pub async fn run_load(job: LoadJob, sink: &Sink) -> Result<LoadSummary> {
    job.extract()?.write(sink).await
}

// =============================================================================
// clean
// =============================================================================

/// Clean a raw store-sales export into a new CSV.
#[derive(Debug, Clone)]
pub struct CleanJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanSummary {
    pub input: String,
    pub output: String,
    pub rows_written: usize,
    pub columns: Vec<String>,
    pub duration_seconds: f64,
}

impl CleanSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub async fn run_clean(job: CleanJob) -> Result<CleanSummary> {
    let started_at = Utc::now();

    let mut table = load_csv(&job.input, &LoadOptions::sales_raw())?;
    clean_sales(&mut table)?;
    info!("Preview:\n{}", table.render_preview(PREVIEW_ROWS));
    write_csv(&table, &job.output)?;

    Ok(CleanSummary {
        input: job.input.display().to_string(),
        output: job.output.display().to_string(),
        rows_written: table.len(),
        columns: table.column_names().iter().map(|c| c.to_string()).collect(),
        duration_seconds: elapsed_seconds(started_at),
    })
}

// =============================================================================
// aggregate
// =============================================================================

/// Per-product totals for one store.
#[derive(Debug, Clone)]
pub struct AggregateJob {
    pub input: PathBuf,
    pub store: String,
    /// Optional destination for the summary table.
    pub sink: Option<Sink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub input: String,
    pub store: String,
    pub rows_matched: usize,
    pub summary: Table,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<WriteOutcome>,
    pub duration_seconds: f64,
}

impl AggregateSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub async fn run_aggregate(job: AggregateJob) -> Result<AggregateSummary> {
    let started_at = Utc::now();

    let mut table = load_csv(&job.input, &LoadOptions::default())?;
    add_total_sales(&mut table)?;

    let store_idx = table.require_column("store_id")?;
    let store_value = key_value(table.columns[store_idx].column_type, &job.store);
    let store_rows = filter_eq(&table, "store_id", &store_value)?;
    if store_rows.is_empty() {
        warn!("No rows for store {} in {}", job.store, job.input.display());
    }

    let summary = group_sum(&store_rows, "product", &["total_sales", "quantity"])?;
    info!("Store {} summary:\n{}", job.store, summary.render_preview(summary.len()));

    let written = match &job.sink {
        Some(sink) => Some(write_table(&summary, sink).await?),
        None => None,
    };

    Ok(AggregateSummary {
        input: job.input.display().to_string(),
        store: job.store,
        rows_matched: store_rows.len(),
        summary,
        written,
        duration_seconds: elapsed_seconds(started_at),
    })
}

/// Filter key typed to match an inferred column.
fn key_value(column_type: ColumnType, raw: &str) -> Value {
    match column_type {
        ColumnType::Int => raw.parse::<i64>().map_or_else(|_| Value::from(raw), Value::Int),
        ColumnType::Float => raw.parse::<f64>().map_or_else(|_| Value::from(raw), Value::float),
        ColumnType::Text | ColumnType::Date => Value::from(raw),
    }
}

// =============================================================================
// rates
// =============================================================================

/// Fetch currency rates (live or fallback) and replace the rates table.
#[derive(Debug, Clone)]
pub struct RatesJob {
    pub url: String,
    pub fallback_path: PathBuf,
    pub timeout: Duration,
    pub sink: Sink,
}

impl RatesJob {
    /// Job built from configuration, writing to `destination`.
    pub fn from_config(config: &Config, destination: Destination) -> Self {
        Self {
            url: config.rates.url.clone(),
            fallback_path: PathBuf::from(&config.rates.fallback_path),
            timeout: Duration::from_secs(config.rates.timeout_secs),
            sink: Sink::new(
                destination,
                WriteTarget::new(&config.rates.table, ExistsPolicy::Replace),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RatesSummary {
    pub source: RateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_error: Option<String>,
    pub currencies: usize,
    pub rows_written: u64,
    pub backend: &'static str,
    pub table: String,
    pub duration_seconds: f64,
}

impl RatesSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub async fn run_rates(job: RatesJob) -> Result<RatesSummary> {
    let started_at = Utc::now();

    info!("Phase 1: Extract");
    let fetched = fetch_rates(&job.url, job.timeout, &job.fallback_path).await?;

    info!("Phase 2: Transform");
    let table = rates_table(&fetched.document);
    info!("Rates:\n{}", table.render_preview(table.len()));

    info!("Phase 3: Load");
    let outcome = write_table(&table, &job.sink).await?;

    Ok(RatesSummary {
        source: fetched.source,
        live_error: fetched.live_error,
        currencies: table.len(),
        rows_written: outcome.rows_written,
        backend: outcome.backend,
        table: outcome.table,
        duration_seconds: elapsed_seconds(started_at),
    })
}

// =============================================================================
// health-check
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EnvVarStatus {
    pub name: &'static str,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    pub destination: String,
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub env: Vec<EnvVarStatus>,
    pub database: DatabaseStatus,
    pub endpoint: EndpointStatus,
}

impl HealthReport {
    /// True when the database accepted a connection and the endpoint answered.
    pub fn healthy(&self) -> bool {
        self.database.connected && self.endpoint.reachable
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Which database variables are set according to `lookup`.
pub fn env_status<F>(lookup: F) -> Vec<EnvVarStatus>
where
    F: Fn(&str) -> Option<String>,
{
    DB_ENV_VARS
        .iter()
        .map(|&name| EnvVarStatus {
            name,
            present: lookup(name).is_some_and(|v| !v.is_empty()),
        })
        .collect()
}

/// Check the environment, the configured database and the rates endpoint.
///
/// Failures are reported, not returned.
pub async fn health_check(config: &Config) -> HealthReport {
    let env = env_status(|key| std::env::var(key).ok());
    for var in &env {
        if var.present {
            info!("{} is set", var.name);
        } else {
            warn!("{} is not set", var.name);
        }
    }

    let database = check_database(&Destination::url(config.database.connection_url())).await;
    let endpoint = probe_endpoint(
        &config.rates.url,
        Duration::from_secs(config.rates.timeout_secs),
    )
    .await;

    HealthReport {
        env,
        database,
        endpoint,
    }
}

/// Open and close a writer for `destination`, timing the round trip.
pub async fn check_database(destination: &Destination) -> DatabaseStatus {
    let start = Instant::now();
    let result = match select_writer(destination).await {
        Ok(writer) => writer.close().await,
        Err(e) => Err(e),
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => DatabaseStatus {
            destination: destination.describe(),
            connected: true,
            latency_ms,
            error: None,
        },
        Err(e) => {
            warn!("Database check failed: {}", e);
            DatabaseStatus {
                destination: destination.describe(),
                connected: false,
                latency_ms,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::EmbeddedWriter;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    const RATES_SAMPLE: &str = r#"{
        "chartName": "Bitcoin",
        "bpi": {
            "USD": {"code": "USD", "rate_float": 42000.0},
            "GBP": {"code": "GBP", "rate_float": 33000.25},
            "EUR": {"code": "EUR", "rate_float": 38500.5}
        }
    }"#;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn sqlite_sink(dir: &TempDir, table: &str, policy: ExistsPolicy) -> Sink {
        Sink::new(
            Destination::embedded(dir.path().join("etl.db")),
            WriteTarget::new(table, policy),
        )
    }

    #[test]
    fn test_load_to_parse() {
        assert_eq!("sqlite".parse::<LoadTo>().unwrap(), LoadTo::Sqlite);
        assert_eq!("Engine".parse::<LoadTo>().unwrap(), LoadTo::Engine);
        assert_eq!("sqlalchemy".parse::<LoadTo>().unwrap(), LoadTo::Engine);
        assert!("postgres".parse::<LoadTo>().is_err());
    }

    #[test]
    fn test_resolve_destination() {
        let config = Config::default();
        let path = Path::new("sales.db");

        assert_eq!(
            resolve_destination(LoadTo::Sqlite, path, None, &config).unwrap(),
            Destination::embedded("sales.db")
        );
        assert_eq!(
            resolve_destination(LoadTo::Engine, path, Some("postgres://h/db"), &config).unwrap(),
            Destination::url("postgres://h/db")
        );

        let err = resolve_destination(LoadTo::Engine, path, None, &config).unwrap_err();
        assert!(matches!(err, EtlError::MissingConnection(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_MISSING_CONNECTION);

        let mut with_url = Config::default();
        with_url.database.url = Some("mysql://h/db".into());
        assert_eq!(
            resolve_destination(LoadTo::Engine, path, None, &with_url).unwrap(),
            Destination::url("mysql://h/db")
        );
    }

    #[tokio::test]
    async fn test_load_dedup_end_to_end() {
        let dir = TempDir::new().unwrap();
        let csv = write_file(&dir, "in.csv", "id,name,amount\n1,A,10\n1,A,10\n");

        let job = LoadJob {
            csv,
            options: LoadOptions::default().with_dedup(true),
        };
        let sink = sqlite_sink(&dir, "t", ExistsPolicy::Replace);
        let summary = run_load(job, &sink).await.unwrap();
        assert_eq!(summary.rows_loaded, 1);
        assert_eq!(summary.rows_written, 1);

        let db = EmbeddedWriter::open(dir.path().join("etl.db")).unwrap();
        let table = db.read_table("t").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.rows[0],
            vec![Value::Int(1), Value::from("A"), Value::Int(10)]
        );
    }

    #[tokio::test]
    async fn test_load_orders_keeps_bad_amounts() {
        let dir = TempDir::new().unwrap();
        let csv = write_file(
            &dir,
            "sales_data.csv",
            "order_id,customer_name,state,order_date,amount\n\
             1,Ana,CA,2024-01-05,10.5\n\
             2,Ben,NY,not a date,abc\n",
        );

        let sink = sqlite_sink(&dir, "sales", ExistsPolicy::Replace);
        let summary = run_load(LoadJob::orders(csv), &sink).await.unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.table, "sales");

        let db = EmbeddedWriter::open(dir.path().join("etl.db")).unwrap();
        let table = db.read_table("sales").unwrap();
        let amount = table.column_index("amount").unwrap();
        let date = table.column_index("order_date").unwrap();
        assert_eq!(table.rows[1][amount], Value::Null);
        assert_eq!(table.rows[1][date], Value::Null);
    }

    #[tokio::test]
    async fn test_load_fail_policy_keeps_prior_rows() {
        let dir = TempDir::new().unwrap();
        let first = write_file(&dir, "a.csv", "id,name\n1,A\n2,B\n");
        let second = write_file(&dir, "b.csv", "id,name\n3,C\n");

        let job = |csv: PathBuf| LoadJob {
            csv,
            options: LoadOptions::default(),
        };
        let fail = sqlite_sink(&dir, "t", ExistsPolicy::Fail);
        run_load(job(first), &fail).await.unwrap();

        let err = run_load(job(second.clone()), &fail).await.unwrap_err();
        assert!(matches!(err, EtlError::TableExists(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_WRITE_ERROR);

        let replace = sqlite_sink(&dir, "t", ExistsPolicy::Replace);
        run_load(job(second), &replace).await.unwrap();
        let db = EmbeddedWriter::open(dir.path().join("etl.db")).unwrap();
        assert_eq!(db.row_count("t").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_csv() {
        let dir = TempDir::new().unwrap();
        let sink = sqlite_sink(&dir, "sales", ExistsPolicy::Replace);
        let err = run_load(LoadJob::orders(dir.path().join("missing.csv")), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::FileNotFound(_)));
        assert!(!dir.path().join("etl.db").exists());
    }

    #[test]
    fn test_extract_fails_before_destination_is_resolved() {
        let dir = TempDir::new().unwrap();
        let err = LoadJob::orders(dir.path().join("missing.csv"))
            .extract()
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CSV_LOAD_ERROR);

        let csv = write_file(&dir, "sales_data.csv", "order_id,amount\n1,2.5\n");
        let loaded = LoadJob::orders(csv).extract().unwrap();
        assert_eq!(loaded.table.len(), 1);
        let err = resolve_destination(LoadTo::Engine, dir.path(), None, &Config::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_MISSING_CONNECTION);
    }

    #[tokio::test]
    async fn test_clean_then_aggregate() {
        let dir = TempDir::new().unwrap();
        let raw = write_file(
            &dir,
            "sales_data.csv",
            "date,store_id,region,product,quantity,price_usd\n\
             2024-01-01,NY01,north east,Widget,2,5.00 USD\n\
             2024-01-01,NY01,north east,Widget,2,5.00 USD\n\
             2024-01-02,NY01,north east,Gadget,,9.50 USD\n\
             2024-01-02,NY01,north east,Widget,1,5.00 USD\n\
             2024-01-03,LA02,west,Widget,4,5.00 USD\n",
        );
        let cleaned = dir.path().join("cleaned_sales_data.csv");

        let clean = run_clean(CleanJob {
            input: raw,
            output: cleaned.clone(),
        })
        .await
        .unwrap();
        assert_eq!(clean.rows_written, 4);
        assert!(clean.columns.contains(&"total_sales".to_string()));

        let aggregate = run_aggregate(AggregateJob {
            input: cleaned,
            store: "NY01".into(),
            sink: Some(sqlite_sink(&dir, "ny_summary", ExistsPolicy::Replace)),
        })
        .await
        .unwrap();
        assert_eq!(aggregate.rows_matched, 3);
        assert_eq!(
            aggregate.summary.rows,
            vec![
                vec![Value::from("Gadget"), Value::Float(0.0), Value::Float(0.0)],
                vec![Value::from("Widget"), Value::Float(15.0), Value::Float(3.0)],
            ]
        );
        assert_eq!(aggregate.written.as_ref().unwrap().rows_written, 2);
    }

    #[tokio::test]
    async fn test_aggregate_numeric_store_ids() {
        let dir = TempDir::new().unwrap();
        let input = write_file(
            &dir,
            "in.csv",
            "store_id,product,quantity,price_usd\n7,Widget,2,1.5\n8,Widget,1,1.5\n",
        );
        let summary = run_aggregate(AggregateJob {
            input,
            store: "7".into(),
            sink: None,
        })
        .await
        .unwrap();
        assert_eq!(summary.rows_matched, 1);
        assert!(summary.written.is_none());
    }

    #[tokio::test]
    async fn test_rates_timeout_writes_fallback_records() {
        let dir = TempDir::new().unwrap();
        let fallback = write_file(&dir, "sample_data.json", RATES_SAMPLE);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let job = RatesJob {
            url: format!("http://{}/currentprice.json", addr),
            fallback_path: fallback,
            timeout: Duration::from_millis(200),
            sink: sqlite_sink(&dir, "crypto_rates", ExistsPolicy::Replace),
        };
        let summary = run_rates(job).await.unwrap();
        assert_eq!(summary.source, RateSource::Fallback);
        assert_eq!(summary.currencies, 3);
        assert_eq!(summary.rows_written, 3);

        let db = EmbeddedWriter::open(dir.path().join("etl.db")).unwrap();
        let table = db.read_table("crypto_rates").unwrap();
        assert_eq!(table.column_names(), vec!["currency", "rate"]);
        assert_eq!(
            table.rows[2],
            vec![Value::from("USD"), Value::Float(42000.0)]
        );
    }

    #[test]
    fn test_rates_job_from_config() {
        let config = Config::default();
        let job = RatesJob::from_config(&config, Destination::embedded("rates.db"));
        assert_eq!(job.sink.target.table, "crypto_rates");
        assert_eq!(job.sink.target.if_exists, ExistsPolicy::Replace);
        assert_eq!(job.timeout, Duration::from_secs(10));
        assert_eq!(job.fallback_path, PathBuf::from("sample_data.json"));
    }

    #[test]
    fn test_env_status() {
        let vars: HashMap<&str, &str> = [("DB_HOST", "db"), ("DB_PASS", "")].into_iter().collect();
        let status = env_status(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(status.len(), DB_ENV_VARS.len());
        assert!(status.iter().any(|s| s.name == "DB_HOST" && s.present));
        assert!(status.iter().any(|s| s.name == "DB_PASS" && !s.present));
    }

    #[tokio::test]
    async fn test_check_database_embedded() {
        let dir = TempDir::new().unwrap();
        let status = check_database(&Destination::embedded(dir.path().join("hc.db"))).await;
        assert!(status.connected);
        assert!(status.error.is_none());
    }

    #[test]
    fn test_summary_json() {
        let summary = LoadSummary {
            input: "sales_data.csv".into(),
            rows_loaded: 3,
            rows_written: 3,
            backend: "embedded",
            table: "sales".into(),
            destination: "sales.db".into(),
            started_at: Utc::now(),
            duration_seconds: 0.1,
        };
        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["rows_written"], 3);
        assert_eq!(json["backend"], "embedded");
    }
}
