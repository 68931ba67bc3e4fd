//! sf-migrate - Migration engine for schemaflow
//!
//! [`Migrator`] combines a [`Registry`](sf_core::Registry) with a
//! [`MigrationStore`](sf_db::MigrationStore) and runs the up, down, redo,
//! status and version operations under the store-wide exclusion lock.

pub mod error;
pub mod migrator;
pub mod report;

pub use error::{FailureKind, MigrateError, MigrateResult, StepError};
pub use migrator::Migrator;
pub use report::StatusReport;
