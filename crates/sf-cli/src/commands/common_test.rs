use super::*;
use std::fs;
use tempfile::TempDir;

fn global_for(dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: dir.display().to_string(),
        config: None,
        dir: None,
        database: None,
    }
}

#[test]
fn test_expand_env_forms() {
    std::env::set_var("SF_CLI_TEST_ROOT", "/srv/app");

    assert_eq!(expand_env("$SF_CLI_TEST_ROOT/migrations"), "/srv/app/migrations");
    assert_eq!(expand_env("${SF_CLI_TEST_ROOT}_db"), "/srv/app_db");
    assert_eq!(expand_env("plain/path"), "plain/path");
    assert_eq!(expand_env("cost$"), "cost$");
    assert_eq!(expand_env("$SF_CLI_TEST_UNSET_VAR/x"), "/x");
    assert_eq!(expand_env("${unterminated"), "${unterminated");
}

#[test]
fn test_defaults_without_config_file() {
    let dir = TempDir::new().unwrap();
    let ctx = load_context(&global_for(dir.path())).unwrap();

    assert_eq!(ctx.migrations_dir(), dir.path().join("migrations"));
    assert_eq!(
        ctx.database_path(),
        dir.path().join("schemaflow.duckdb").display().to_string()
    );
}

#[test]
fn test_flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("schemaflow.yml"),
        "migrations_dir: db/migrations\ndatabase:\n  path: app.duckdb\n",
    )
    .unwrap();

    let ctx = load_context(&global_for(dir.path())).unwrap();
    assert_eq!(ctx.migrations_dir(), dir.path().join("db/migrations"));

    let mut global = global_for(dir.path());
    global.dir = Some("other".to_string());
    global.database = Some(":memory:".to_string());
    let ctx = load_context(&global).unwrap();
    assert_eq!(ctx.migrations_dir(), dir.path().join("other"));
    assert_eq!(ctx.database_path(), ":memory:");
}

#[test]
fn test_explicit_missing_config_is_error() {
    let dir = TempDir::new().unwrap();
    let mut global = global_for(dir.path());
    global.config = Some(dir.path().join("nope.yml").display().to_string());

    assert!(load_context(&global).is_err());
}

#[test]
fn test_empty_database_override_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut global = global_for(dir.path());
    global.database = Some("$SF_CLI_TEST_NEVER_SET".to_string());

    assert!(load_context(&global).is_err());
}

#[test]
fn test_load_migrations_requires_directory() {
    let dir = TempDir::new().unwrap();
    let ctx = load_context(&global_for(dir.path())).unwrap();

    let err = load_migrations(&ctx).unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    fs::create_dir(dir.path().join("migrations")).unwrap();
    assert!(load_migrations(&ctx).unwrap().is_empty());
}

#[tokio::test]
async fn test_read_only_connect_skips_missing_database() {
    let dir = TempDir::new().unwrap();
    let ctx = load_context(&global_for(dir.path())).unwrap();

    assert!(connect_read_only(&ctx).await.unwrap().is_none());
    assert!(!Path::new(&ctx.database_path()).exists());
}
