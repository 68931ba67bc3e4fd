//! Status command implementation

use anyhow::{Context, Result};
use sf_migrate::StatusReport;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{connect_read_only, load_context};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let report = match connect_read_only(&ctx).await? {
        Some(migrator) => {
            let result = migrator.status().await;
            migrator.close().await;
            result.context("Failed to read migration status")?
        }
        None => StatusReport::new(Vec::new()),
    };

    match args.output {
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        StatusOutput::Table if report.is_empty() => println!("No migrations recorded"),
        StatusOutput::Table => println!("{report}"),
    }
    Ok(())
}
