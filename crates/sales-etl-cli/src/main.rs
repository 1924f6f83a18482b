//! sales-etl CLI - CSV and currency-rate extract/transform/load jobs.

use clap::{Parser, Subcommand};
use sales_etl::load::{Destination, ExistsPolicy, WriteTarget};
use sales_etl::pipeline::{self, AggregateJob, CleanJob, LoadJob, LoadTo, RatesJob, Sink};
use sales_etl::{Config, EtlError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "sales-etl")]
#[command(about = "Sales CSV and currency-rate ETL jobs")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (default: environment and .env)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an order CSV into a database table
    Load {
        /// Input CSV file
        #[arg(long, default_value = "sales_data.csv")]
        csv: PathBuf,

        /// Destination backend: sqlite or engine
        #[arg(long, default_value = "sqlite")]
        to: String,

        /// SQLite database file for --to sqlite
        #[arg(long, default_value = "sales.db")]
        db_path: PathBuf,

        /// Connection URL for --to engine (default: DB_URL)
        #[arg(long)]
        conn: Option<String>,

        /// Destination table
        #[arg(long, default_value = "sales")]
        table: String,

        /// Behavior when the table exists: fail, replace or append
        #[arg(long, default_value = "replace")]
        if_exists: String,
    },

    /// Deduplicate and enrich a raw store-sales CSV
    Clean {
        /// Raw input CSV
        #[arg(long, default_value = "sales_data.csv")]
        input: PathBuf,

        /// Cleaned output CSV
        #[arg(long, default_value = "cleaned_sales_data.csv")]
        output: PathBuf,
    },

    /// Summarize one store's sales per product
    Aggregate {
        /// Cleaned sales CSV
        #[arg(long, default_value = "cleaned_sales_data.csv")]
        input: PathBuf,

        /// Store to summarize
        #[arg(long, default_value = "NY01")]
        store: String,

        /// Also write the summary: sqlite or engine
        #[arg(long)]
        to: Option<String>,

        /// SQLite database file for --to sqlite
        #[arg(long, default_value = "sales.db")]
        db_path: PathBuf,

        /// Connection URL for --to engine (default: DB_URL)
        #[arg(long)]
        conn: Option<String>,

        /// Destination table for the summary
        #[arg(long, default_value = "store_summary")]
        table: String,

        /// Behavior when the table exists: fail, replace or append
        #[arg(long, default_value = "replace")]
        if_exists: String,
    },

    /// Fetch currency rates (live or local fallback) into a table
    Rates {
        /// Rate feed URL [default: from configuration]
        #[arg(long)]
        url: Option<String>,

        /// Local JSON used when the feed is unavailable
        #[arg(long)]
        fallback: Option<PathBuf>,

        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Destination table [default: crypto_rates]
        #[arg(long)]
        table: Option<String>,

        /// Write to this SQLite file instead of the configured database
        #[arg(long, conflicts_with = "conn")]
        db_path: Option<PathBuf>,

        /// Write to this connection URL instead of the configured database
        #[arg(long)]
        conn: Option<String>,
    },

    /// Check environment variables, database connectivity and the rate feed
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), EtlError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(EtlError::Config)?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Load {
            csv,
            to,
            db_path,
            conn,
            table,
            if_exists,
        } => {
            let to: LoadTo = to.parse()?;
            let if_exists: ExistsPolicy = if_exists.parse()?;

            // A bad input file is reported before a missing connection.
            let loaded = LoadJob::orders(csv).extract()?;
            let destination =
                pipeline::resolve_destination(to, &db_path, conn.as_deref(), &config)?;
            let sink = Sink::new(destination, WriteTarget::new(table, if_exists));
            let result = loaded.write(&sink).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nLoad completed!");
                println!("  Input: {}", result.input);
                println!("  Rows loaded: {}", result.rows_loaded);
                println!(
                    "  Rows written: {} -> {} ({})",
                    result.rows_written, result.table, result.destination
                );
                println!("  Backend: {}", result.backend);
                println!("  Duration: {:.2}s", result.duration_seconds);
            }
        }

        Commands::Clean { input, output } => {
            let result = pipeline::run_clean(CleanJob { input, output }).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nClean completed!");
                println!("  Input: {}", result.input);
                println!("  Output: {} ({} rows)", result.output, result.rows_written);
                println!("  Columns: {}", result.columns.join(", "));
            }
        }

        Commands::Aggregate {
            input,
            store,
            to,
            db_path,
            conn,
            table,
            if_exists,
        } => {
            let sink = match to {
                Some(to) => {
                    let to: LoadTo = to.parse()?;
                    let if_exists: ExistsPolicy = if_exists.parse()?;
                    let destination =
                        pipeline::resolve_destination(to, &db_path, conn.as_deref(), &config)?;
                    Some(Sink::new(destination, WriteTarget::new(table, if_exists)))
                }
                None => None,
            };

            let result = pipeline::run_aggregate(AggregateJob { input, store, sink }).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!(
                    "\nStore {} ({} rows matched):",
                    result.store, result.rows_matched
                );
                println!("{}", result.summary.render_preview(result.summary.len()));
                if let Some(ref written) = result.written {
                    println!(
                        "  Written: {} rows -> {} ({})",
                        written.rows_written, written.table, written.backend
                    );
                }
            }
        }

        Commands::Rates {
            url,
            fallback,
            timeout,
            table,
            db_path,
            conn,
        } => {
            let destination = match (db_path, conn) {
                (Some(path), _) => Destination::embedded(path),
                (None, Some(url)) => Destination::url(url),
                (None, None) => Destination::url(config.database.connection_url()),
            };

            let mut job = RatesJob::from_config(&config, destination);
            if let Some(url) = url {
                job.url = url;
            }
            if let Some(path) = fallback {
                job.fallback_path = path;
            }
            if let Some(secs) = timeout {
                job.timeout = Duration::from_secs(secs);
            }
            if let Some(table) = table {
                job.sink.target.table = table;
            }

            let result = pipeline::run_rates(job).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nRates completed!");
                println!("  Source: {:?}", result.source);
                if let Some(ref err) = result.live_error {
                    println!("    Live fetch error: {}", err);
                }
                println!("  Currencies: {}", result.currencies);
                println!(
                    "  Rows written: {} -> {} ({})",
                    result.rows_written, result.table, result.backend
                );
            }
        }

        Commands::HealthCheck => {
            let result = pipeline::health_check(&config).await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Health Check Results:");
                for var in &result.env {
                    println!(
                        "  {}: {}",
                        var.name,
                        if var.present { "set" } else { "missing" }
                    );
                }
                println!(
                    "  Database ({}): {} ({}ms)",
                    result.database.destination,
                    if result.database.connected { "OK" } else { "FAILED" },
                    result.database.latency_ms
                );
                if let Some(ref err) = result.database.error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Rate feed: {} ({}ms)",
                    if result.endpoint.reachable { "OK" } else { "FAILED" },
                    result.endpoint.latency_ms
                );
                if let Some(ref err) = result.endpoint.error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy() { "HEALTHY" } else { "UNHEALTHY" }
                );
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Invalid verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("Invalid log format '{}'", other)),
    }

    Ok(())
}
