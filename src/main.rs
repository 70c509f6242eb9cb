//! Visit Analytics dashboard service
//!
//! Serves aggregated visit metrics over HTTP:
//! - Summary, time series and breakdowns for a date range
//! - Top pages and event counts
//! - Health and readiness probes for the persistence backend

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use aggregation::AnalyticsQuery;
use analytics_core::limits::DEFAULT_QUERY_TIMEOUT_SECS;
use analytics_core::RowSource;
use api::{router, AppState};
use backend::{RestClient, RestConfig};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig};
use telemetry::{health, init_tracing_from_env};

/// Which persistence backend serves row selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum BackendKind {
    Rest,
    Clickhouse,
}

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default = "default_backend")]
    backend: BackendKind,

    #[serde(default)]
    rest: RestConfig,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    /// Seconds a built report is served from cache
    #[serde(default = "default_report_cache_ttl_secs")]
    report_cache_ttl_secs: u64,

    /// Upper bound on a single row select
    #[serde(default = "default_query_timeout_secs")]
    query_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> BackendKind {
    BackendKind::Rest
}

fn default_report_cache_ttl_secs() -> u64 {
    30
}

fn default_query_timeout_secs() -> u64 {
    DEFAULT_QUERY_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend: default_backend(),
            rest: RestConfig::default(),
            clickhouse: ClickHouseConfig::default(),
            report_cache_ttl_secs: default_report_cache_ttl_secs(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Visit Analytics v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(backend = ?config.backend, "Loaded configuration");

    let source = connect_backend(&config).await?;
    check_health(source.as_ref()).await;

    let query = AnalyticsQuery::new(source)
        .with_timeout(Duration::from_secs(config.query_timeout_secs));
    let state = AppState::with_query(query, Duration::from_secs(config.report_cache_ttl_secs));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Build the row source for the configured backend.
async fn connect_backend(config: &Config) -> Result<Arc<dyn RowSource>> {
    match config.backend {
        BackendKind::Rest => {
            info!(base_url = %config.rest.base_url, "Using REST backend");
            let client =
                RestClient::new(config.rest.clone()).context("Failed to create REST client")?;
            Ok(Arc::new(client))
        }
        BackendKind::Clickhouse => {
            info!(url = %config.clickhouse.url, database = %config.clickhouse.database, "Using ClickHouse backend");
            let client = ClickHouseClient::new(config.clickhouse.clone())
                .context("Failed to create ClickHouse client")?;

            if let Err(e) = clickhouse_client::init_schema(&client).await {
                error!("Failed to initialize ClickHouse schema: {}", e);
                // Continue anyway - schema might already exist
            }
            Ok(Arc::new(client))
        }
    }
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ANALYTICS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Nested fields with underscores don't parse reliably through the
    // separator, so read them explicitly.
    if let Ok(url) = std::env::var("ANALYTICS_REST_BASE_URL") {
        config.rest.base_url = url;
    }
    if let Ok(key) = std::env::var("ANALYTICS_REST_API_KEY") {
        config.rest.api_key = key;
    }
    if let Ok(table) = std::env::var("ANALYTICS_REST_VISITS_TABLE") {
        config.rest.visits_table = table;
    }
    if let Ok(table) = std::env::var("ANALYTICS_REST_EVENTS_TABLE") {
        config.rest.events_table = table;
    }

    if let Ok(url) = std::env::var("ANALYTICS_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("ANALYTICS_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("ANALYTICS_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("ANALYTICS_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    Ok(config)
}

/// Check backend health on startup.
async fn check_health(source: &dyn RowSource) {
    if source.check_connection().await {
        health().backend.set_healthy();
        info!("Backend connection: healthy");
    } else {
        health().backend.set_unhealthy("Connection failed");
        error!("Backend connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
