//! Configuration loading and validation.
//!
//! Configuration is populated once at startup, either from a YAML file or from
//! the process environment (after loading `.env` if one is present), and then
//! passed explicitly to the jobs that need it.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use tracing::debug;

use crate::error::{EtlError, Result};

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    ///
    /// Loads `.env` from the working directory first; variables already set
    /// in the environment win over the file.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(EtlError::Config(format!("Invalid .env file: {}", e))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Absent or empty variables keep their documented defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Config::default();
        let db = &mut config.database;
        if let Some(host) = get(ENV_DB_HOST) {
            db.host = host;
        }
        if let Some(port) = get(ENV_DB_PORT) {
            db.port = port.trim().parse().map_err(|_| {
                EtlError::Config(format!("{} must be a port number, got '{}'", ENV_DB_PORT, port))
            })?;
        }
        if let Some(user) = get(ENV_DB_USER) {
            db.user = user;
        }
        if let Some(password) = get(ENV_DB_PASS) {
            db.password = password;
        }
        if let Some(name) = get(ENV_DB_NAME) {
            db.name = name;
        }
        db.url = get(ENV_DB_URL);

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl DatabaseConfig {
    /// Connection URL for the full SQL engine.
    ///
    /// Returns the explicit URL when one is configured, otherwise a
    /// PostgreSQL URL assembled from the individual parts.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}
