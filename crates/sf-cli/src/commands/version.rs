//! Version command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{connect_read_only, load_context};

/// Execute the version command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let Some(migrator) = connect_read_only(&ctx).await? else {
        println!("0");
        return Ok(());
    };

    let result = migrator.db_version().await;
    migrator.close().await;

    println!("{}", result.context("Failed to read database version")?);
    Ok(())
}
