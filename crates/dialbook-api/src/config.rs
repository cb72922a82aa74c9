//! Configuration read from the environment at startup.

use std::time::Duration;

use dialbook_event_store::pools::{CLIENT_MANAGEMENT_DB_KEY, ConnectionConfig, EVENT_STORE_DB_KEY};

use crate::error::AppError;

/// Default `SHUTDOWN_TIMEOUT_MS`.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

/// Default `POLL_INTERVAL_MS`.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key).ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

/// Database URLs of the event store and of the read models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `DATABASE_URL`: the event store.
    pub event_store_url: String,
    /// `CLIENT_MANAGEMENT_DATABASE_URL`: read models and resume tokens.
    /// Defaults to the event store URL.
    pub client_management_url: String,
}

impl DatabaseConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let event_store_url = required(lookup, "DATABASE_URL")?;
        let client_management_url =
            lookup("CLIENT_MANAGEMENT_DATABASE_URL").unwrap_or_else(|| event_store_url.clone());
        Ok(Self {
            event_store_url,
            client_management_url,
        })
    }

    /// Maps both URLs onto their connection pool keys.
    #[must_use]
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new()
            .with_database(EVENT_STORE_DB_KEY, &self.event_store_url)
            .with_database(CLIENT_MANAGEMENT_DB_KEY, &self.client_management_url)
            .with_acquire_timeout(Duration::from_secs(5))
    }
}

/// Settings of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Databases.
    pub database: DatabaseConfig,
    /// `HOST`, default `0.0.0.0`.
    pub host: String,
    /// `PORT`, default 3000.
    pub port: u16,
}

impl AppConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a missing or malformed variable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a missing or malformed variable.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            database: DatabaseConfig::from_lookup(lookup)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(lookup, "PORT", 3000)?,
        })
    }
}

/// Settings of the streaming application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Databases.
    pub database: DatabaseConfig,
    /// `SHUTDOWN_TIMEOUT_MS`: how long pipelines may take to drain.
    pub shutdown_timeout: Duration,
    /// `POLL_INTERVAL_MS`: delay between polls of an idle change feed.
    pub poll_interval: Duration,
}

impl StreamConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a missing or malformed variable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a missing or malformed variable.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            database: DatabaseConfig::from_lookup(lookup)?,
            shutdown_timeout: Duration::from_millis(parsed(
                lookup,
                "SHUTDOWN_TIMEOUT_MS",
                DEFAULT_SHUTDOWN_TIMEOUT_MS,
            )?),
            poll_interval: Duration::from_millis(parsed(
                lookup,
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
        })
    }
}
