//! Scaffolding for new migration fragments.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::discovery::list_identifiers;
use crate::error::{CoreError, CoreResult};
use crate::fragment::{FragmentKind, FragmentName};
use crate::migration_name::MigrationName;
use crate::registry::next_version;
use crate::status::Direction;

/// Files written for a new migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMigration {
    pub version: u32,
    pub up: PathBuf,
    pub down: PathBuf,
}

/// Create the up/down fragments for a new migration in `dir`.
///
/// The version is one past the highest version already present. Existing
/// files are never overwritten, and `name` must be an
/// [identifier](MigrationName::is_identifier).
pub fn create_migration(
    dir: &Path,
    name: &MigrationName,
    kind: FragmentKind,
) -> CoreResult<CreatedMigration> {
    if !name.is_identifier() {
        return Err(CoreError::InvalidMigrationName {
            name: name.to_string(),
            reason: "new migrations may only use [A-Za-z0-9_-]".to_string(),
        });
    }

    fs::create_dir_all(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let existing = list_identifiers(dir)?;
    let version = next_version(existing.iter().map(String::as_str));

    let up = write_fragment(dir, version, name, Direction::Up, kind)?;
    let down = match write_fragment(dir, version, name, Direction::Down, kind) {
        Ok(path) => path,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&up) {
                log::warn!("Failed to remove {}: {remove_err}", up.display());
            }
            return Err(e);
        }
    };
    log::info!("Created migration v{:05} {}", version, name);

    Ok(CreatedMigration { version, up, down })
}

fn write_fragment(
    dir: &Path,
    version: u32,
    name: &MigrationName,
    direction: Direction,
    kind: FragmentKind,
) -> CoreResult<PathBuf> {
    let fragment = FragmentName::new(version, name.clone(), direction, kind);
    let path = dir.join(fragment.file_name());

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                CoreError::FragmentExists {
                    path: path.display().to_string(),
                }
            } else {
                CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;
    file.write_all(template(&fragment).as_bytes())?;
    Ok(path)
}

fn template(fragment: &FragmentName) -> String {
    match fragment.kind {
        FragmentKind::Sql => String::new(),
        FragmentKind::Script => format!(
            "#!/bin/sh\n\
             # {direction} script for migration {version} ({name}).\n\
             # SF_MIGRATION_VERSION, SF_MIGRATION_NAME, SF_MIGRATION_DIRECTION and\n\
             # SF_DATABASE are set by schemaflow. Exit non-zero to fail the migration.\n\
             set -e\n",
            direction = fragment.direction,
            version = fragment.version,
            name = fragment.name,
        ),
    }
}
