use super::Store;
use deadpool_postgres::PoolConfig;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;
#[cfg(feature = "ssl-native-tls")]
use {native_tls::TlsConnector, postgres_native_tls::MakeTlsConnector};

/// Store configuration errors
#[derive(Debug, Error)]
pub enum Error {
    /// Bubbled-up configuration errors from the underlying `deadpool_postgres` configuration
    #[error("Error creating the connection pool: {0}")]
    Create(#[from] deadpool_postgres::CreatePoolError),
    #[cfg(feature = "ssl-native-tls")]
    /// TLS errors during setup of SSL connectors
    #[error("Error setting up TLS connection: {0}")]
    Tls(#[from] native_tls::Error),
}

/// Environment-derived configuration for the store's connection pool
#[derive(Deserialize, Debug)]
pub struct Configuration {
    /// maximum amount of time to wait for a statement to complete (in milliseconds)
    #[serde(default, deserialize_with = "from_milliseconds_string")]
    pub statement_timeout: Option<Duration>,
    /// maximum number of pooled connections, defaulting to deadpool's own sizing
    #[serde(default)]
    pub pool_size: Option<usize>,
    /// Postgres database to connect to
    pub pgdbname: String,
    /// host to use for database connections
    #[serde(default = "get_localhost")]
    pub pghost: String,
    /// Password to use for database connections
    pub pgpassword: String,
    /// Port to use for database connections
    #[serde(default = "get_postgres_port")]
    pub pgport: u16,
    /// User to use for database connections
    pub pguser: String,
}

impl Configuration {
    /// Derive a store from this configuration. No connections are made until the first request.
    pub fn create_store(self) -> Result<Store, Error> {
        // set up TLS connectors
        #[cfg(feature = "ssl-native-tls")]
        let connector = TlsConnector::builder().build()?;
        #[cfg(feature = "ssl-native-tls")]
        let tls_connector = MakeTlsConnector::new(connector);
        #[cfg(not(feature = "ssl-native-tls"))]
        let tls_connector = tokio_postgres::NoTls;

        // configure the underlying connection pool
        let config = deadpool_postgres::Config {
            dbname: Some(self.pgdbname),
            host: Some(self.pghost),
            password: Some(self.pgpassword),
            port: Some(self.pgport),
            user: Some(self.pguser),
            pool: self.pool_size.map(PoolConfig::new),
            ..deadpool_postgres::Config::default()
        };

        // generate the pool from configuration
        let pool = config.create_pool(None, tls_connector)?;

        Ok(Store::new(pool, self.statement_timeout))
    }
}

/// Generate a default "localhost" host value
fn get_localhost() -> String {
    "localhost".to_string()
}

/// Generate a default port for connecting to the postgres database
fn get_postgres_port() -> u16 {
    5432
}

/// Deserializer for milliseconds, passed through the environment as a string
fn from_milliseconds_string<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let base_string = String::deserialize(deserializer)?;
    if base_string.is_empty() {
        Ok(None)
    } else {
        let parsed_millis: u64 = base_string.parse().map_err(serde::de::Error::custom)?;
        let duration = Duration::from_millis(parsed_millis);

        Ok(Some(duration))
    }
}

#[cfg(all(test, feature = "server"))]
mod test {
    use super::Configuration;
    use std::time::Duration;

    fn variables(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        [
            ("PGDBNAME", "turbos"),
            ("PGPASSWORD", "supersecretpassword"),
            ("PGUSER", "postgres"),
        ]
        .iter()
        .chain(extra)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    #[test]
    fn applies_defaults() {
        let configuration: Configuration =
            envy::from_iter(variables(&[])).expect("Failed to read minimal configuration");

        assert_eq!(configuration.pghost, "localhost");
        assert_eq!(configuration.pgport, 5432);
        assert_eq!(configuration.statement_timeout, None);
        assert_eq!(configuration.pool_size, None);
    }

    #[test]
    fn reads_statement_timeouts_in_milliseconds() {
        let configuration: Configuration = envy::from_iter(variables(&[
            ("STATEMENT_TIMEOUT", "1500"),
            ("POOL_SIZE", "4"),
        ]))
        .expect("Failed to read configuration");

        assert_eq!(
            configuration.statement_timeout,
            Some(Duration::from_millis(1500))
        );
        assert_eq!(configuration.pool_size, Some(4));
    }

    #[test]
    fn rejects_non_numeric_timeouts() {
        let result = envy::from_iter::<_, Configuration>(variables(&[("STATEMENT_TIMEOUT", "soon")]));

        assert!(result.is_err());
    }

    #[test]
    fn creates_stores_without_connecting() {
        let configuration: Configuration =
            envy::from_iter(variables(&[("PGHOST", "db.invalid")])).unwrap();

        assert!(configuration.create_store().is_ok());
    }
}
