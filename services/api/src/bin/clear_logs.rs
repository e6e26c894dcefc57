//! services/api/src/bin/clear_logs.rs
//!
//! Deletes every daily log in the database. User profiles are kept.

use api_lib::{
    adapters::{DbAdapter, DisabledCompletionAdapter},
    config::Config,
    error::ApiError,
};
use health_log_core::{service::HealthService, AdvisorSettings};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    let db = Arc::new(DbAdapter::new(db_pool));
    db.run_migrations().await?;

    let service = HealthService::new(
        db,
        Arc::new(DisabledCompletionAdapter),
        AdvisorSettings::default(),
    );
    let deleted = service.clear_all_logs().await?;
    println!("Deleted {} daily logs", deleted);
    Ok(())
}
