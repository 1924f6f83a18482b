//! Error types for the ETL library.

use std::path::PathBuf;

use thiserror::Error;

/// Process exit code for a successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// Invalid configuration or arguments.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// The input CSV could not be found or parsed.
pub const EXIT_CSV_LOAD_ERROR: u8 = 2;
/// A connection string was required but none was supplied.
pub const EXIT_MISSING_CONNECTION: u8 = 3;
/// The destination database rejected the write.
pub const EXIT_WRITE_ERROR: u8 = 4;
/// Both the live feed and the local fallback were unusable.
pub const EXIT_FETCH_ERROR: u8 = 5;
/// File system error outside of CSV loading.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for ETL operations.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration error (invalid YAML, bad value, missing field)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file does not exist
    #[error("CSV file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Malformed delimited input
    #[error("CSV parse error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A database URL is required for the chosen destination
    #[error("Missing connection string: {0}")]
    MissingConnection(String),

    /// Destination table exists and the policy is `fail`
    #[error("Table '{0}' already exists (if-exists=fail)")]
    TableExists(String),

    /// Full SQL engine error (connect or statement)
    #[cfg(feature = "engine")]
    #[error("SQL engine error: {0}")]
    Engine(#[from] sqlx::Error),

    /// Embedded SQLite driver error
    #[error("Embedded database error: {0}")]
    Embedded(#[from] rusqlite::Error),

    /// Write failed for a specific table
    #[error("Write failed for table {table}: {message}")]
    Write { table: String, message: String },

    /// HTTP transport or status error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote fetch failed and the local fallback could not be read
    #[error("Fallback read failed for {}: {source}", path.display())]
    Fallback {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EtlError {
    /// Create a CSV parse error for the given input path
    pub fn csv(path: impl Into<String>, source: csv::Error) -> Self {
        EtlError::Csv {
            path: path.into(),
            source,
        }
    }

    /// Create a Write error
    pub fn write(table: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::Write {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Map the error to the process exit code reported by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::Config(_) | EtlError::Yaml(_) => EXIT_CONFIG_ERROR,
            EtlError::FileNotFound(_) | EtlError::Csv { .. } => EXIT_CSV_LOAD_ERROR,
            EtlError::MissingConnection(_) => EXIT_MISSING_CONNECTION,
            EtlError::TableExists(_) | EtlError::Write { .. } | EtlError::Embedded(_) => {
                EXIT_WRITE_ERROR
            }
            #[cfg(feature = "engine")]
            EtlError::Engine(_) => EXIT_WRITE_ERROR,
            EtlError::Network(_) | EtlError::Fallback { .. } | EtlError::Json(_) => {
                EXIT_FETCH_ERROR
            }
            EtlError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;
