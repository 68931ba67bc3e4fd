use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "sf",
        "up",
        "--dir",
        "$HOME/migrations",
        "--database",
        ":memory:",
        "-v",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Up));
    assert!(cli.global.verbose);
    assert_eq!(cli.global.dir.as_deref(), Some("$HOME/migrations"));
    assert_eq!(cli.global.database.as_deref(), Some(":memory:"));
    assert_eq!(cli.global.project_dir, ".");
}

#[test]
fn test_create_defaults_to_sql() {
    let cli = Cli::try_parse_from(["sf", "create", "add_users"]).unwrap();
    match cli.command {
        Commands::Create(args) => {
            assert_eq!(args.name, "add_users");
            assert_eq!(args.kind, TemplateKind::Sql);
            assert_eq!(FragmentKind::from(args.kind), FragmentKind::Sql);
        }
        other => panic!("expected create, got {other:?}"),
    }
}

#[test]
fn test_create_script_kind() {
    let cli = Cli::try_parse_from(["sf", "create", "backfill", "--kind", "sh"]).unwrap();
    match cli.command {
        Commands::Create(args) => assert_eq!(FragmentKind::from(args.kind), FragmentKind::Script),
        other => panic!("expected create, got {other:?}"),
    }
}

#[test]
fn test_status_output_formats() {
    let cli = Cli::try_parse_from(["sf", "status", "-o", "json"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Status(StatusArgs {
            output: StatusOutput::Json
        })
    ));

    assert!(Cli::try_parse_from(["sf", "status", "-o", "yaml"]).is_err());
}

#[test]
fn test_unlock_takes_no_arguments() {
    let cli = Cli::try_parse_from(["sf", "unlock", "--database", "app.duckdb"]).unwrap();
    assert!(matches!(cli.command, Commands::Unlock));
    assert!(Cli::try_parse_from(["sf", "unlock", "holder"]).is_err());
}
