//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use sf_core::{load_registry, Config, CoreError, Registry};
use sf_db::{DuckDbStore, StoreOptions};
use sf_migrate::Migrator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Resolved project settings for one invocation
#[derive(Debug)]
pub(crate) struct ProjectContext {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl ProjectContext {
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path(&self.root)
    }

    /// Database path resolved against the project root; `:memory:` is kept as is
    pub(crate) fn database_path(&self) -> String {
        let path = &self.config.database.path;
        if path == ":memory:" || Path::new(path).is_absolute() {
            path.clone()
        } else {
            self.root.join(path).display().to_string()
        }
    }
}

/// Load the project config and apply command-line overrides.
///
/// A missing `schemaflow.yml` falls back to defaults; an explicit `--config`
/// that does not exist is an error.
pub(crate) fn load_context(global: &GlobalArgs) -> Result<ProjectContext> {
    let root = PathBuf::from(&global.project_dir);

    let mut config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => match Config::load_from_dir(&root) {
            Ok(config) => config,
            Err(CoreError::ConfigNotFound { path }) => {
                log::debug!("No config at {path}, using defaults");
                Config::default()
            }
            Err(e) => return Err(e).context("Failed to load project config"),
        },
    };

    if let Some(dir) = &global.dir {
        config.migrations_dir = expand_env(dir);
    }
    if let Some(database) = &global.database {
        config.database.path = expand_env(database);
    }
    config
        .validate()
        .context("Invalid configuration after applying overrides")?;

    Ok(ProjectContext { root, config })
}

/// Build the registry from the migrations directory, which must exist
pub(crate) fn load_migrations(ctx: &ProjectContext) -> Result<Registry> {
    let dir = ctx.migrations_dir();
    if !dir.is_dir() {
        bail!("Migrations directory {} does not exist", dir.display());
    }
    load_registry(&dir, &ctx.config.script_interpreter)
        .with_context(|| format!("Failed to load migrations from {}", dir.display()))
}

/// Build a migrator over the configured DuckDB store and connect it.
///
/// Callers must `close` the returned migrator on every path.
pub(crate) async fn connect(ctx: &ProjectContext, registry: Registry) -> Result<Migrator> {
    let store = DuckDbStore::new(ctx.database_path(), StoreOptions::from_config(&ctx.config));
    let migrator = Migrator::new(Arc::new(store), registry);
    migrator
        .connect()
        .await
        .with_context(|| format!("Failed to open database {}", ctx.database_path()))?;
    Ok(migrator)
}

/// Connect a read-only migrator for reporting commands.
///
/// Returns `None` when the database file does not exist yet, so reporting
/// never creates a database or its tables.
pub(crate) async fn connect_read_only(ctx: &ProjectContext) -> Result<Option<Migrator>> {
    let path = ctx.database_path();
    if path != ":memory:" && !Path::new(&path).exists() {
        log::debug!("Database {path} does not exist yet");
        return Ok(None);
    }
    let options = StoreOptions::from_config(&ctx.config).read_only();
    let migrator = Migrator::new(Arc::new(DuckDbStore::new(path.clone(), options)), Registry::new());
    migrator
        .connect()
        .await
        .with_context(|| format!("Failed to open database {path}"))?;
    Ok(Some(migrator))
}

/// Expand `$VAR` and `${VAR}` from the environment; unset variables expand to
/// an empty string.
pub(crate) fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(&lookup(&braced[..end]));
                    rest = &braced[end + 1..];
                }
                None => {
                    // unterminated, keep literally
                    out.push_str(&rest[pos..]);
                    rest = "";
                }
            }
            continue;
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]));
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

fn lookup(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
