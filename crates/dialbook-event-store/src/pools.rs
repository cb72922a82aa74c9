//! Connection pools, one per logical database.
//!
//! Components register the configuration keys they need at startup. Each key
//! maps to a database URL and gets exactly one pool, sized after the number
//! of registered users of that key, created on first use.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::Mutex;

/// Configuration key of the event store database.
pub const EVENT_STORE_DB_KEY: &str = "EVENT_STORE_DB";

/// Configuration key of the client management (read model) database.
pub const CLIENT_MANAGEMENT_DB_KEY: &str = "CLIENT_MANAGEMENT_DB";

/// Smallest pool created for any key.
pub const MIN_POOL_SIZE: u32 = 5;

/// Errors raised while acquiring a database handle.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No database URL is configured for the key.
    #[error("no database configured for key {0}")]
    UnknownConfigKey(String),

    /// Connecting to or pinging the database failed.
    #[error("database {key} unreachable: {source}")]
    Connect {
        /// The configuration key.
        key: String,
        /// The underlying driver error.
        #[source]
        source: sqlx::Error,
    },
}

/// Static connection settings: one database URL per configuration key.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    urls: HashMap<String, String>,
    acquire_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `key` to `url`.
    #[must_use]
    pub fn with_database(mut self, key: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.insert(key.into(), url.into());
        self
    }

    /// Bounds how long acquiring a connection may wait.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }
}

/// Explicitly constructed replacement for a process-wide pool registry.
#[derive(Debug)]
pub struct ConnectionPools {
    config: ConnectionConfig,
    users: HashMap<String, u32>,
    pools: Mutex<HashMap<String, PgPool>>,
}

impl ConnectionPools {
    /// Creates pools for `config`; no connection is opened yet.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            users: HashMap::new(),
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one more user for each key. Call once per component before the
    /// first `client_database`.
    pub fn register_client_configs<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for key in keys {
            *self.users.entry(key.into()).or_default() += 1;
        }
    }

    /// Returns the pool size used for `key`: the number of registered users,
    /// never below [`MIN_POOL_SIZE`].
    #[must_use]
    pub fn pool_size(&self, key: &str) -> u32 {
        self.users
            .get(key)
            .copied()
            .unwrap_or_default()
            .max(MIN_POOL_SIZE)
    }

    /// Returns the ready pool for `key`, connecting and pinging it on first
    /// use. Later calls return the same pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::UnknownConfigKey` for an unconfigured key and
    /// `PoolError::Connect` if the database cannot be reached.
    pub async fn client_database(&self, key: &str) -> Result<PgPool, PoolError> {
        let mut pools = self.pools.lock().await;
        if let Some(pool) = pools.get(key) {
            return Ok(pool.clone());
        }

        let url = self
            .config
            .urls
            .get(key)
            .ok_or_else(|| PoolError::UnknownConfigKey(key.to_owned()))?;
        let size = self.pool_size(key);

        let mut options = PgPoolOptions::new().max_connections(size);
        if let Some(timeout) = self.config.acquire_timeout {
            options = options.acquire_timeout(timeout);
        }
        let connect_error = |source| PoolError::Connect {
            key: key.to_owned(),
            source,
        };
        let pool = options.connect(url).await.map_err(connect_error)?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(connect_error)?;

        tracing::info!(config_key = key, pool_size = size, "database connected");
        pools.insert(key.to_owned(), pool.clone());
        Ok(pool)
    }

    /// Pings the pool of `key`. A key that has not connected yet is unhealthy.
    pub async fn health(&self, key: &str) -> bool {
        let pool = self.pools.lock().await.get(key).cloned();
        match pool {
            Some(pool) => sqlx::query("SELECT 1").execute(&pool).await.is_ok(),
            None => false,
        }
    }

    /// Closes every open pool.
    pub async fn close(&self) {
        let pools: Vec<PgPool> = self.pools.lock().await.drain().map(|(_, p)| p).collect();
        for pool in pools {
            pool.close().await;
        }
    }
}

/// Reports whether the databases a process depends on answer.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    /// Pings every database, keyed by configuration key.
    async fn check(&self) -> BTreeMap<String, bool>;
}

#[async_trait]
impl DatabaseHealth for ConnectionPools {
    /// Every registered key is reported, connected or not.
    async fn check(&self) -> BTreeMap<String, bool> {
        let mut report = BTreeMap::new();
        for key in self.users.keys() {
            report.insert(key.clone(), self.health(key).await);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_has_a_floor() {
        let pools = ConnectionPools::new(ConnectionConfig::new());

        assert_eq!(pools.pool_size(EVENT_STORE_DB_KEY), MIN_POOL_SIZE);
    }

    #[test]
    fn test_pool_size_grows_with_registered_users() {
        // Arrange
        let mut pools = ConnectionPools::new(ConnectionConfig::new());

        // Act
        for _ in 0..7 {
            pools.register_client_configs([CLIENT_MANAGEMENT_DB_KEY, EVENT_STORE_DB_KEY]);
        }
        pools.register_client_configs([CLIENT_MANAGEMENT_DB_KEY]);

        // Assert
        assert_eq!(pools.pool_size(CLIENT_MANAGEMENT_DB_KEY), 8);
        assert_eq!(pools.pool_size(EVENT_STORE_DB_KEY), 7);
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected_without_connecting() {
        let pools = ConnectionPools::new(
            ConnectionConfig::new().with_database(EVENT_STORE_DB_KEY, "postgres://unused"),
        );

        let result = pools.client_database(CLIENT_MANAGEMENT_DB_KEY).await;

        match result {
            Err(PoolError::UnknownConfigKey(key)) => assert_eq!(key, CLIENT_MANAGEMENT_DB_KEY),
            other => panic!("expected UnknownConfigKey, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unconnected_key_is_unhealthy() {
        let pools = ConnectionPools::new(ConnectionConfig::new());

        assert!(!pools.health(EVENT_STORE_DB_KEY).await);
    }

    #[tokio::test]
    async fn test_check_reports_every_registered_key() {
        // Arrange
        let mut pools = ConnectionPools::new(ConnectionConfig::new());
        pools.register_client_configs([EVENT_STORE_DB_KEY, CLIENT_MANAGEMENT_DB_KEY]);

        // Act
        let report = pools.check().await;

        // Assert
        assert_eq!(
            report,
            BTreeMap::from([
                (CLIENT_MANAGEMENT_DB_KEY.to_owned(), false),
                (EVENT_STORE_DB_KEY.to_owned(), false),
            ])
        );
    }
}
