//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use sf_core::FragmentKind;

/// schemaflow - versioned SQL migrations for DuckDB
#[derive(Parser, Debug)]
#[command(name = "sf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override migrations directory ($VAR references are expanded)
    #[arg(short, long, global = true)]
    pub dir: Option<String>,

    /// Override DuckDB database path ($VAR references are expanded)
    #[arg(long, global = true)]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create up/down fragments for a new migration
    Create(CreateArgs),

    /// Apply all pending migrations
    Up,

    /// Roll back the last applied migration
    Down,

    /// Roll back and re-apply the last applied migration
    Redo,

    /// Show recorded migration history
    Status(StatusArgs),

    /// Print the current database version
    Version,

    /// Clear a migration lock left by a run that died
    Unlock,
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Migration name (letters, digits, '_' and '-')
    #[arg(env = "NAME")]
    pub name: String,

    /// Fragment kind to scaffold
    #[arg(short, long, value_enum, default_value = "sql")]
    pub kind: TemplateKind,
}

/// Fragment templates for create
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Raw SQL statements
    Sql,
    /// Shell script run by the configured interpreter
    Sh,
}

impl From<TemplateKind> for FragmentKind {
    fn from(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Sql => FragmentKind::Sql,
            TemplateKind::Sh => FragmentKind::Script,
        }
    }
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Bordered table
    Table,
    /// JSON document
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
