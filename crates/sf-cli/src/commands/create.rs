//! Create command implementation

use anyhow::{Context, Result};
use sf_core::{create_migration, MigrationName};

use crate::cli::{CreateArgs, GlobalArgs};
use crate::commands::common::load_context;

/// Execute the create command
pub async fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let name = MigrationName::try_new(args.name.trim())
        .filter(MigrationName::is_identifier)
        .with_context(|| {
            format!(
                "Invalid migration name '{}': use letters, digits, '_' or '-'",
                args.name
            )
        })?;

    let created = create_migration(&ctx.migrations_dir(), &name, args.kind.into())
        .context("Failed to create migration")?;

    println!("Created migration {:05} {}", created.version, name);
    println!("  {}", created.up.display());
    println!("  {}", created.down.display());
    Ok(())
}
