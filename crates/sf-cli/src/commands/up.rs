//! Up command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{connect, load_context, load_migrations};

/// Execute the up command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let registry = load_migrations(&ctx)?;
    let migrator = connect(&ctx, registry).await?;

    let result = migrator.up().await;
    migrator.close().await;
    let applied = result.context("Up failed")?;

    match applied.last() {
        Some(version) => println!(
            "Applied {} migration{}, now at version {}",
            applied.len(),
            if applied.len() == 1 { "" } else { "s" },
            version
        ),
        None => println!("Already up to date"),
    }
    Ok(())
}
