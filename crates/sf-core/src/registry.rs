//! Migration registry: the per-run, version-ordered set of migrations.
//!
//! The registry is built fresh from discovered fragments on every run.
//! Construction is all-or-nothing: one unparsable fragment, a version gap, or
//! an up/down name disagreement fails the whole build.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::action::{MigrationAction, ProcessAction};
use crate::error::{CoreError, CoreResult};
use crate::fragment::{leading_version, FragmentKind, FragmentName, ScriptFragment};
use crate::migration::{Migration, MigrationBody};
use crate::migration_name::MigrationName;
use crate::status::Direction;

/// Dense, 1-based mapping from version to migration
#[derive(Debug, Clone, Default)]
pub struct Registry {
    migrations: BTreeMap<u32, Migration>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from discovered fragments.
    ///
    /// Fragments are merged in the order given: for a shared version, a later
    /// fragment overwrites only the direction it supplies, and an empty SQL
    /// body never clears one already set. Executable fragments become
    /// [`ProcessAction`]s run with `interpreter`.
    pub fn from_fragments<I>(fragments: I, interpreter: &str) -> CoreResult<Self>
    where
        I: IntoIterator<Item = ScriptFragment>,
    {
        let mut registry = Self::new();
        for fragment in fragments {
            registry.add_fragment(&fragment, interpreter)?;
        }
        registry.validate()?;
        log::debug!("Registry built with {} migrations", registry.len());
        Ok(registry)
    }

    /// Parse one fragment and merge it into the registry.
    pub fn add_fragment(&mut self, fragment: &ScriptFragment, interpreter: &str) -> CoreResult<()> {
        let parsed = FragmentName::parse(&fragment.identifier)?;
        let body = match parsed.kind {
            FragmentKind::Sql => MigrationBody::Sql(fragment.contents.clone()),
            FragmentKind::Script => MigrationBody::Action(Arc::new(ProcessAction::new(
                interpreter,
                fragment.script_path(),
            ))),
        };
        self.merge(parsed.version, parsed.name, parsed.direction, Some(body))
    }

    /// Merge one direction's body into the migration at `version`.
    ///
    /// `None` or an empty body registers the version without touching
    /// existing bodies.
    pub fn merge(
        &mut self,
        version: u32,
        name: MigrationName,
        direction: Direction,
        body: Option<MigrationBody>,
    ) -> CoreResult<()> {
        if let Some(existing) = self.migrations.get(&version) {
            if existing.name != name {
                return Err(CoreError::NameMismatch {
                    version,
                    existing: existing.name.to_string(),
                    incoming: name.into_inner(),
                });
            }
        }
        let migration = self
            .migrations
            .entry(version)
            .or_insert_with(|| Migration::new(version, name));

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            match direction {
                Direction::Up => migration.up = Some(body),
                Direction::Down => migration.down = Some(body),
            }
        }
        Ok(())
    }

    /// Append a migration at the next version with in-process bodies.
    ///
    /// Returns the assigned version.
    pub fn register(
        &mut self,
        name: MigrationName,
        up: Option<Arc<dyn MigrationAction>>,
        down: Option<Arc<dyn MigrationAction>>,
    ) -> u32 {
        let version = self.max_version() + 1;
        let mut migration = Migration::new(version, name);
        migration.up = up.map(MigrationBody::Action);
        migration.down = down.map(MigrationBody::Action);
        self.migrations.insert(version, migration);
        version
    }

    /// Append a migration at the next version with SQL bodies.
    pub fn register_sql(
        &mut self,
        name: MigrationName,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> u32 {
        let version = self.max_version() + 1;
        let mut migration = Migration::new(version, name);
        migration.up = Some(MigrationBody::Sql(up.into())).filter(|b| !b.is_empty());
        migration.down = Some(MigrationBody::Sql(down.into())).filter(|b| !b.is_empty());
        self.migrations.insert(version, migration);
        version
    }

    /// Check that versions run 1, 2, ..., n with no gaps
    pub fn validate(&self) -> CoreResult<()> {
        for (index, version) in self.migrations.keys().enumerate() {
            let expected = index as u32 + 1;
            if *version != expected {
                return Err(CoreError::VersionGap {
                    expected,
                    found: *version,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn get(&self, version: u32) -> Option<&Migration> {
        self.migrations.get(&version)
    }

    /// Highest registered version, or 0 when empty
    pub fn max_version(&self) -> u32 {
        self.migrations.keys().next_back().copied().unwrap_or(0)
    }

    /// Migrations with a version strictly greater than `version`
    pub fn after(&self, version: u32) -> impl Iterator<Item = &Migration> {
        self.migrations
            .range(version.saturating_add(1)..)
            .map(|(_, m)| m)
    }
}

/// Version for a newly created migration: one past the highest version among
/// `identifiers`, or 1 when none carry a version.
pub fn next_version<'a, I>(identifiers: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    identifiers
        .into_iter()
        .filter_map(leading_version)
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
