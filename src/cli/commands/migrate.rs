use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = super::connect().await?;
    database.migrate().await?;
    database.close().await;
    output_success(output_format, "Migrations applied", Some(json!({ "migrated": true })))
}
