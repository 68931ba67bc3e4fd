//! Redo command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{connect, load_context, load_migrations};

/// Execute the redo command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let registry = load_migrations(&ctx)?;
    let migrator = connect(&ctx, registry).await?;

    let result = migrator.redo().await;
    migrator.close().await;

    match result.context("Redo failed")? {
        Some(version) => println!("Redid version {version}"),
        None => println!("No applied migrations to redo"),
    }
    Ok(())
}
