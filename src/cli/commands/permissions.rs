use serde_json::json;

use crate::auth::permissions::{all, CATALOG};
use crate::cli::utils::output_data;
use crate::cli::OutputFormat;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let catalog = json!({ "groups": CATALOG, "permissions": all() });
    output_data(output_format, &catalog, |_| {
        for group in CATALOG {
            println!("{:<10} {}", group.domain, group.actions.join(", "));
        }
    })
}
