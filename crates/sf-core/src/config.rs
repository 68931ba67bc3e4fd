//! Configuration types and parsing for schemaflow.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from schemaflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing migration fragments
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Table holding the migration history
    #[serde(default = "default_history_table")]
    pub history_table: String,

    /// Single-row table used as the store-wide exclusion lock
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// A lock held longer than this is treated as abandoned and may be taken
    /// over; `null` disables takeover
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: Option<u64>,

    /// Program used to run `.sh` migration fragments
    #[serde(default = "default_script_interpreter")]
    pub script_interpreter: String,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file path (`:memory:` for an in-memory database)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            database: DatabaseConfig::default(),
            history_table: default_history_table(),
            lock_table: default_lock_table(),
            lock_timeout_secs: default_lock_timeout_secs(),
            script_interpreter: default_script_interpreter(),
        }
    }
}

/// Default age after which a migration lock counts as abandoned
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 900;

fn default_lock_timeout_secs() -> Option<u64> {
    Some(DEFAULT_LOCK_TIMEOUT_SECS)
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_db_path() -> String {
    "schemaflow.duckdb".to_string()
}

fn default_history_table() -> String {
    "sf_migrations".to_string()
}

fn default_lock_table() -> String {
    "sf_migration_lock".to_string()
}

fn default_script_interpreter() -> String {
    "sh".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for schemaflow.yml or schemaflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("schemaflow.yml");
        let yaml_path = dir.join("schemaflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }
        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        for (field, table) in [
            ("history_table", &self.history_table),
            ("lock_table", &self.lock_table),
        ] {
            if !is_plain_identifier(table) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "{field} '{table}' must be a plain SQL identifier ([A-Za-z_][A-Za-z0-9_]*)"
                    ),
                });
            }
        }
        if self.history_table == self.lock_table {
            return Err(CoreError::ConfigInvalid {
                message: "history_table and lock_table must differ".to_string(),
            });
        }
        if self.script_interpreter.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "script_interpreter cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Migrations directory resolved against `root` when relative
    pub fn migrations_path(&self, root: &Path) -> PathBuf {
        let dir = Path::new(&self.migrations_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }
}

/// Table names are interpolated into SQL, so only bare identifiers are allowed.
fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
