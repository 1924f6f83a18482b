//! Configuration validation.

use super::Config;
use crate::error::{EtlError, Result};
use crate::load::dialect::url_scheme;

/// URL schemes the full SQL engine understands.
const SUPPORTED_SCHEMES: &[&str] = &["postgres", "postgresql", "mysql", "mariadb", "sqlite"];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let db = &config.database;

    match &db.url {
        Some(url) => {
            let scheme = url_scheme(url);
            if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
                return Err(EtlError::Config(format!(
                    "database.url scheme must be one of {:?}, got '{}'",
                    SUPPORTED_SCHEMES, scheme
                )));
            }
        }
        None => {
            if db.host.is_empty() {
                return Err(EtlError::Config("database.host is required".into()));
            }
            if db.name.is_empty() {
                return Err(EtlError::Config("database.name is required".into()));
            }
            if db.port == 0 {
                return Err(EtlError::Config("database.port must be non-zero".into()));
            }
        }
    }

    if config.rates.url.is_empty() {
        return Err(EtlError::Config("rates.url is required".into()));
    }
    if config.rates.timeout_secs == 0 {
        return Err(EtlError::Config(
            "rates.timeout_secs must be at least 1".into(),
        ));
    }
    if config.rates.table.is_empty() {
        return Err(EtlError::Config("rates.table is required".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_missing_host() {
        let mut config = Config::default();
        config.database.host = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_url_skips_part_checks() {
        let mut config = Config::default();
        config.database.host = String::new();
        config.database.url = Some("postgresql://u:p@h:5432/db".into());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_driver_suffixed_scheme() {
        let mut config = Config::default();
        config.database.url = Some("postgresql+psycopg2://u:p@h:5432/db".into());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_url_scheme() {
        let mut config = Config::default();
        config.database.url = Some("oracle://h/db".into());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.rates.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = Config::default();
        config.database.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.database);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password_123"));
    }
}
