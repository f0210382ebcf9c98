//! Database helpers for the logistics API.
//!
//! The application pool stores orders, recipients and deliverymen. It is
//! separate from Tasker's internal database.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::AppConfig;

/// Type alias for the application database pool.
pub type AppDb = PgPool;

/// Connect to the application database and apply pending migrations.
pub async fn connect(config: &AppConfig) -> anyhow::Result<AppDb> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    info!("Connected to application database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Application migrations complete");

    Ok(pool)
}
