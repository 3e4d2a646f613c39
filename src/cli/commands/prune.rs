use serde_json::json;

use crate::auth::session;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

/// Drop expired refresh sessions and spent SSO ticket markers
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = super::connect().await?;
    let sessions = session::purge_expired(database.pool()).await?;
    let tickets = session::purge_redemptions(database.pool()).await?;
    database.close().await;

    output_success(
        output_format,
        &format!("Removed {} expired session(s) and {} ticket marker(s)", sessions, tickets),
        Some(json!({ "sessions": sessions, "tickets": tickets })),
    )
}
