//! sf-core - Core library for schemaflow
//!
//! This crate provides the migration data model, the per-migration status
//! state machine, fragment-name parsing, the migration registry, the
//! executable-action capability, and configuration loading shared by the
//! other schemaflow crates.

pub mod action;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fragment;
pub mod migration;
pub mod migration_name;
pub mod registry;
pub mod scaffold;
pub mod status;

pub use action::{ActionContext, ActionError, FnAction, MigrationAction, ProcessAction};
pub use config::{Config, DatabaseConfig};
pub use discovery::{discover_fragments, load_registry};
pub use error::{CoreError, CoreResult};
pub use fragment::{FragmentKind, FragmentName, ScriptFragment};
pub use migration::{Migration, MigrationBody, MigrationRecord};
pub use migration_name::MigrationName;
pub use registry::{next_version, Registry};
pub use scaffold::{create_migration, CreatedMigration};
pub use status::{Direction, MigrationStatus};
