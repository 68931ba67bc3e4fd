//! Down command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{connect, load_context, load_migrations};

/// Execute the down command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let registry = load_migrations(&ctx)?;
    let migrator = connect(&ctx, registry).await?;

    let result = migrator.down().await;
    migrator.close().await;

    match result.context("Down failed")? {
        Some(version) => println!("Rolled back version {version}"),
        None => println!("No applied migrations to roll back"),
    }
    Ok(())
}
