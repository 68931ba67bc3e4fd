//! Unlock command implementation

use anyhow::{Context, Result};
use sf_core::Registry;

use crate::cli::GlobalArgs;
use crate::commands::common::{connect, load_context};

/// Execute the unlock command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let migrator = connect(&ctx, Registry::new()).await?;

    let result = migrator.force_unlock().await;
    migrator.close().await;

    match result.context("Failed to clear the migration lock")? {
        Some(holder) => println!("Cleared migration lock held by {holder}"),
        None => println!("No migration lock held"),
    }
    Ok(())
}
