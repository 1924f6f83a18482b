//! # sales-etl
//!
//! Small extract/transform/load jobs over sales CSV exports and a currency
//! rate feed.
//!
//! - **Loader**: CSV into an in-memory [`Table`] with best-effort coercion
//!   and optional duplicate removal
//! - **Writer**: the full SQL engine (sqlx, behind the `engine` feature)
//!   with an embedded SQLite fallback (rusqlite) for local files
//! - **Remote extract**: live JSON rates with a local fallback document
//!
//! ## Example
//!
//! ```rust,no_run
//! use sales_etl::load::{Destination, ExistsPolicy, WriteTarget};
//! use sales_etl::pipeline::{run_load, LoadJob, Sink};
//!
//! #[tokio::main]
//! async fn main() -> sales_etl::Result<()> {
//!     let sink = Sink::new(
//!         Destination::embedded("sales.db"),
//!         WriteTarget::new("sales", ExistsPolicy::Replace),
//!     );
//!     let summary = run_load(LoadJob::orders("sales_data.csv"), &sink).await?;
//!     println!("Loaded {} rows via {}", summary.rows_written, summary.backend);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod transform;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, RatesConfig};
pub use crate::core::{Column, ColumnType, Table, Value};
pub use error::{EtlError, Result};
pub use load::{Destination, ExistsPolicy, TableWriter, WriteTarget};
pub use pipeline::{
    AggregateSummary, CleanSummary, HealthReport, LoadSummary, LoadTo, RatesSummary,
};
