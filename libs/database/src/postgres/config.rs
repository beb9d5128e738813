use sea_orm::ConnectOptions;
use std::time::Duration;
use tracing::log::LevelFilter;

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default, env_required};

/// PostgreSQL connection pool configuration
///
/// The registration API loads this from the environment at startup and
/// hands it to `connect_from_config_with_retry`. Construct it manually in
/// tests that need a fixed URL.
///
/// # Example
///
/// ```ignore
/// use database::postgres::{PostgresConfig, connect_from_config};
/// use core_config::FromEnv;
///
/// let config = PostgresConfig::from_env()?;
/// let db = connect_from_config(config).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    /// Database connection URL (required)
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,

    /// Connection idle timeout in seconds
    pub idle_timeout_secs: u64,

    /// Connection max lifetime in seconds
    pub max_lifetime_secs: u64,

    /// Enable SQL query logging
    pub sqlx_logging: bool,

    /// SQL logging level
    pub sqlx_logging_level: LevelFilter,
}

impl PostgresConfig {
    /// Create a config for `url` with the default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 100,
            min_connections: 5,
            connect_timeout_secs: 8,
            acquire_timeout_secs: 8,
            idle_timeout_secs: 8,
            max_lifetime_secs: 8,
            sqlx_logging: true,
            sqlx_logging_level: LevelFilter::Info,
        }
    }

    /// Convert this config into SeaORM ConnectOptions
    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(&self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .sqlx_logging(self.sqlx_logging)
            .sqlx_logging_level(self.sqlx_logging_level);
        opt
    }

    /// Get a reference to the database URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "config")]
fn env_parsed<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        })
}

/// Load PostgresConfig from environment variables
///
/// Environment variables:
/// - `DATABASE_URL` (required) - PostgreSQL connection string
/// - `DB_MAX_CONNECTIONS` (optional, default: 100)
/// - `DB_MIN_CONNECTIONS` (optional, default: 5)
/// - `DB_CONNECT_TIMEOUT_SECS` (optional, default: 8)
/// - `DB_ACQUIRE_TIMEOUT_SECS` (optional, default: 8)
/// - `DB_IDLE_TIMEOUT_SECS` (optional, default: 8)
/// - `DB_MAX_LIFETIME_SECS` (optional, default: 8)
/// - `DB_SQLX_LOGGING` (optional, default: true)
#[cfg(feature = "config")]
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections: env_parsed("DB_MAX_CONNECTIONS", "100")?,
            min_connections: env_parsed("DB_MIN_CONNECTIONS", "5")?,
            connect_timeout_secs: env_parsed("DB_CONNECT_TIMEOUT_SECS", "8")?,
            acquire_timeout_secs: env_parsed("DB_ACQUIRE_TIMEOUT_SECS", "8")?,
            idle_timeout_secs: env_parsed("DB_IDLE_TIMEOUT_SECS", "8")?,
            max_lifetime_secs: env_parsed("DB_MAX_LIFETIME_SECS", "8")?,
            sqlx_logging: env_parsed("DB_SQLX_LOGGING", "true")?,
            sqlx_logging_level: LevelFilter::Info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_pool_defaults() {
        let config = PostgresConfig::new("postgresql://localhost/registration");
        assert_eq!(config.url(), "postgresql://localhost/registration");
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.min_connections, 5);
        assert!(config.sqlx_logging);
    }

    #[test]
    fn test_into_connect_options_consumes_config() {
        let config = PostgresConfig::new("postgresql://localhost/registration");
        let _options = config.into_connect_options();
        // ConnectOptions hides its fields; this only checks the conversion builds
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_with_only_url() {
        temp_env::with_var(
            "DATABASE_URL",
            Some("postgresql://localhost/registration"),
            || {
                let config = PostgresConfig::from_env().unwrap();
                assert_eq!(config.url(), "postgresql://localhost/registration");
                assert_eq!(config.max_connections, 100);
                assert_eq!(config.acquire_timeout_secs, 8);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_overrides_pool_settings() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/registration")),
                ("DB_MAX_CONNECTIONS", Some("20")),
                ("DB_MIN_CONNECTIONS", Some("2")),
                ("DB_SQLX_LOGGING", Some("false")),
            ],
            || {
                let config = PostgresConfig::from_env().unwrap();
                assert_eq!(config.max_connections, 20);
                assert_eq!(config.min_connections, 2);
                assert!(!config.sqlx_logging);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = PostgresConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_reports_unparseable_values() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/registration")),
                ("DB_MAX_CONNECTIONS", Some("plenty")),
            ],
            || {
                let err = PostgresConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
            },
        );
    }
}
