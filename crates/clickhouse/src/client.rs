//! ClickHouse client wrapper.

use crate::config::ClickHouseConfig;
use analytics_core::{DbErrorCode, Error, Result};
use clickhouse::Client;
use std::future::Future;
use tracing::info;

/// ClickHouse client bound to one analytics database.
///
/// Table names are always qualified with the configured database, so the
/// same client can create that database before it exists.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        if config.database.is_empty()
            || !config
                .database
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::internal(format!(
                "invalid ClickHouse database name '{}'",
                config.database
            )));
        }

        let mut client = Client::default().with_url(&config.url);

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    /// Database-qualified table name.
    pub fn table(&self, name: &str) -> String {
        format!("{}.{}", self.config.database, name)
    }

    /// Run a ClickHouse call under the configured timeout.
    pub(crate) async fn timed<T>(
        &self,
        fallback: DbErrorCode,
        fut: impl Future<Output = clickhouse::error::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.timeout(), fut).await {
            Ok(result) => result.map_err(|e| map_error(fallback, e)),
            Err(_) => Err(Error::database(
                DbErrorCode::Timeout,
                format!("ClickHouse call exceeded {}s", self.config.timeout_secs),
            )),
        }
    }
}

/// Classify a driver error.
pub(crate) fn map_error(fallback: DbErrorCode, err: clickhouse::error::Error) -> Error {
    let code = match &err {
        clickhouse::error::Error::Network(_) => DbErrorCode::Unavailable,
        clickhouse::error::Error::TimedOut => DbErrorCode::Timeout,
        _ => fallback,
    };
    Error::database(code, format!("ClickHouse error: {}", err))
}
