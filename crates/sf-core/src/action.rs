//! Executable migration bodies.
//!
//! A migration direction can be a runnable action instead of raw SQL. The
//! orchestrator only sees [`MigrationAction`]; whether the action shells out
//! ([`ProcessAction`]) or runs a registered Rust closure ([`FnAction`]) is
//! decided when the registry is built.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

use crate::migration_name::MigrationName;
use crate::status::Direction;

/// Errors raised while running an executable migration body
#[derive(Error, Debug)]
pub enum ActionError {
    /// A001: The external process could not be started
    #[error("[A001] Failed to start '{program}' for {path}: {source}")]
    Spawn {
        program: String,
        path: String,
        source: std::io::Error,
    },

    /// A002: The external process exited unsuccessfully
    #[error("[A002] Script {path} exited with {status}")]
    NonZeroExit { path: String, status: String },

    /// A003: An in-process action reported failure
    #[error("[A003] Migration action failed: {0}")]
    Failed(String),
}

/// What an action knows about the migration it is running for
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub version: u32,
    pub name: MigrationName,
    pub direction: Direction,
    /// Connection target of the store, passed through to external scripts
    pub database: Option<String>,
}

/// A runnable migration body
#[async_trait]
pub trait MigrationAction: Send + Sync + fmt::Debug {
    /// Run the action; `Err` marks the migration as failed
    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError>;
}

type ActionFuture = Pin<Box<dyn Future<Output = Result<(), ActionError>> + Send>>;

/// In-process action backed by an async closure
pub struct FnAction {
    label: String,
    func: Box<dyn Fn(ActionContext) -> ActionFuture + Send + Sync>,
}

impl FnAction {
    /// Wrap `func` as a migration action; `label` is only used for logging
    pub fn new<F, Fut>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            func: Box::new(move |ctx| Box::pin(func(ctx))),
        }
    }
}

impl fmt::Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MigrationAction for FnAction {
    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        log::debug!("Running in-process action '{}'", self.label);
        (self.func)(ctx.clone()).await
    }
}

/// Action that runs a script file as an external process
///
/// The script is started as `<interpreter> <path>` with the migration's
/// version, name and direction exported as `SF_MIGRATION_*` variables and the
/// store target as `SF_DATABASE`.
#[derive(Debug, Clone)]
pub struct ProcessAction {
    interpreter: String,
    path: PathBuf,
}

impl ProcessAction {
    pub fn new(interpreter: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl MigrationAction for ProcessAction {
    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        log::info!(
            "Running {} script for v{:05} {}: {} {}",
            ctx.direction,
            ctx.version,
            ctx.name,
            self.interpreter,
            self.path.display()
        );

        let mut cmd = tokio::process::Command::new(&self.interpreter);
        cmd.arg(&self.path)
            .env("SF_MIGRATION_VERSION", ctx.version.to_string())
            .env("SF_MIGRATION_NAME", ctx.name.as_str())
            .env("SF_MIGRATION_DIRECTION", ctx.direction.as_str());
        if let Some(database) = &ctx.database {
            cmd.env("SF_DATABASE", database);
        }

        let status = cmd.status().await.map_err(|e| ActionError::Spawn {
            program: self.interpreter.clone(),
            path: self.path.display().to_string(),
            source: e,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::NonZeroExit {
                path: self.path.display().to_string(),
                status: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
