//! schemaflow CLI - versioned SQL migrations for DuckDB

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{create, down, redo, status, unlock, up, version};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match &cli.command {
        cli::Commands::Create(args) => create::execute(args, &cli.global).await,
        cli::Commands::Up => up::execute(&cli.global).await,
        cli::Commands::Down => down::execute(&cli.global).await,
        cli::Commands::Redo => redo::execute(&cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::Version => version::execute(&cli.global).await,
        cli::Commands::Unlock => unlock::execute(&cli.global).await,
    }
}

/// `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
