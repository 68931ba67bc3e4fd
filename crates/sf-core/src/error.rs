//! Error types for sf-core

use thiserror::Error;

/// Core error type for schemaflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Fragment identifier does not match `<version>_<name>_<direction>.<kind>`
    #[error("[C003] Invalid migration name '{name}': {reason}")]
    InvalidMigrationName { name: String, reason: String },

    /// C004: Registry versions are not dense and 1-based
    #[error("[C004] Migration versions must be contiguous from 1: expected version {expected}, found {found}")]
    VersionGap { expected: u32, found: u32 },

    /// C005: Up and down halves of one version disagree on the name
    #[error("[C005] Version {version} has conflicting names '{existing}' and '{incoming}'")]
    NameMismatch {
        version: u32,
        existing: String,
        incoming: String,
    },

    /// C006: Refusing to overwrite an existing fragment
    #[error("[C006] Migration file already exists: {path}")]
    FragmentExists { path: String },

    /// C007: IO error
    #[error("[C007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C008: IO error with file path context
    #[error("[C008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C009: YAML parse error
    #[error("[C009] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
