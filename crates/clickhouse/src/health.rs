//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use crate::schema::all_tables;
use analytics_core::{DbErrorCode, Result};
use tracing::{debug, error};

/// Check ClickHouse connection health.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    let probe = client.inner().query("SELECT 1").fetch_one::<u8>();
    match client.timed(DbErrorCode::Unavailable, probe).await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            true
        }
        Err(e) => {
            error!(error = %e, "ClickHouse health check failed");
            false
        }
    }
}

/// Create the database and tables if missing.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    for ddl in all_tables(&client.config().database) {
        client
            .timed(DbErrorCode::StoreFailed, client.inner().query(&ddl).execute())
            .await?;
    }

    debug!(database = %client.config().database, "ClickHouse schema initialized");
    Ok(())
}
