pub mod migrate;
pub mod payroll;
pub mod permissions;
pub mod prune;
pub mod seed;

use crate::config::config;
use crate::database::manager::DatabaseManager;

/// Eager pool from the environment's database settings
pub(crate) async fn connect() -> anyhow::Result<DatabaseManager> {
    let manager = DatabaseManager::connect(&config().database).await?;
    Ok(manager)
}
