use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use shopforge_core::redact_connection_string;

use crate::errors::Result;

pub const MAX_CONNECTIONS: u32 = 5;
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pool and confirm the server answers.
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await?;

    let version = server_version(&pool).await?;
    info!(
        event = "db_connected",
        connection = %redact_connection_string(url).redacted,
        version = %version,
        "connected to database"
    );
    Ok(pool)
}

pub async fn server_version(pool: &PgPool) -> Result<String> {
    let version = sqlx::query_scalar::<_, String>("select version()")
        .fetch_one(pool)
        .await?;
    Ok(version)
}
