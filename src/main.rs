//! Operational entrypoint: loads configuration, applies migrations and seeds
//! the reference data the services depend on.

use std::sync::Arc;

use warranty_parts_api::config::{init_tracing, AppConfig};
use warranty_parts_api::db;
use warranty_parts_api::errors::ServiceError;
use warranty_parts_api::services::CostCenterService;

use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    let pool = Arc::new(db::establish_connection(&config.database_url).await?);

    if config.auto_migrate {
        db::run_migrations(&pool).await?;
    }

    let seeded = CostCenterService::new(pool.clone()).seed_defaults().await?;
    if seeded > 0 {
        info!(count = seeded, "Cost centers seeded");
    }

    info!(environment = %config.environment, "Database ready");
    Ok(())
}
