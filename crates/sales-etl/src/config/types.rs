//! Configuration type definitions and their documented defaults.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable holding the database host.
pub const ENV_DB_HOST: &str = "DB_HOST";
/// Environment variable holding the database port.
pub const ENV_DB_PORT: &str = "DB_PORT";
/// Environment variable holding the database user.
pub const ENV_DB_USER: &str = "DB_USER";
/// Environment variable holding the database password.
pub const ENV_DB_PASS: &str = "DB_PASS";
/// Environment variable holding the database name.
pub const ENV_DB_NAME: &str = "DB_NAME";
/// Environment variable holding a full connection URL. Overrides the parts.
pub const ENV_DB_URL: &str = "DB_URL";

/// The per-part variables reported by the health check.
pub const DB_ENV_VARS: &[&str] = &[ENV_DB_HOST, ENV_DB_NAME, ENV_DB_USER, ENV_DB_PASS, ENV_DB_PORT];

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relational destination used by jobs that do not name one explicitly.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Remote rate feed and its local fallback.
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Database connection settings.
///
/// Every field has a default so a bare environment still yields a usable
/// (if placeholder) connection URL.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host (default: "localhost").
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username (default: "user").
    #[serde(default = "default_user")]
    pub user: String,

    /// Password (default: "password").
    #[serde(default = "default_password")]
    pub password: String,

    /// Database name (default: "database").
    #[serde(default = "default_database")]
    pub name: String,

    /// Full connection URL. When set, the individual parts are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            name: default_database(),
            url: None,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Rate feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Live endpoint (default: the CoinDesk current-price document).
    #[serde(default = "default_rates_url")]
    pub url: String,

    /// Local JSON file with the same structure as the live document.
    #[serde(default = "default_fallback_path")]
    pub fallback_path: PathBuf,

    /// Network timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Destination table (default: "crypto_rates").
    #[serde(default = "default_rates_table")]
    pub table: String,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            url: default_rates_url(),
            fallback_path: default_fallback_path(),
            timeout_secs: default_timeout_secs(),
            table: default_rates_table(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "user".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_database() -> String {
    "database".to_string()
}

fn default_rates_url() -> String {
    "https://api.coindesk.com/v1/bpi/currentprice.json".to_string()
}

fn default_fallback_path() -> PathBuf {
    PathBuf::from("sample_data.json")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_rates_table() -> String {
    "crypto_rates".to_string()
}
