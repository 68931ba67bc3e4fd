use super::*;

#[test]
fn test_parse_sql_up_fragment() {
    let parsed = FragmentName::parse("00001_create_users_up.sql").unwrap();
    assert_eq!(parsed.version, 1);
    assert_eq!(parsed.name, "create_users");
    assert_eq!(parsed.direction, Direction::Up);
    assert_eq!(parsed.kind, FragmentKind::Sql);
}

#[test]
fn test_parse_script_down_fragment() {
    let parsed = FragmentName::parse("12_backfill_emails_down.sh").unwrap();
    assert_eq!(parsed.version, 12);
    assert_eq!(parsed.name, "backfill_emails");
    assert_eq!(parsed.direction, Direction::Down);
    assert_eq!(parsed.kind, FragmentKind::Script);
}

#[test]
fn test_parse_single_word_name() {
    let parsed = FragmentName::parse("3_init_up.sql").unwrap();
    assert_eq!(parsed.name, "init");
}

#[test]
fn test_parse_rejects_malformed_identifiers() {
    for bad in [
        "create_users_up.sql",
        "00001_up.sql",
        "00001create_users_up.sql",
        "00001_create_users_sideways.sql",
        "00001_create_users_up",
        "00001_create_users_up.py",
        "00000_create_users_up.sql",
        "99999999999_create_users_up.sql",
        "00001__up.sql",
    ] {
        let err = FragmentName::parse(bad).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidMigrationName { .. }),
            "expected invalid-name error for {bad}, got {err:?}"
        );
    }
}

#[test]
fn test_parse_accepts_any_non_empty_name() {
    let dotted = FragmentName::parse("00001_users.v2_up.sql").unwrap();
    assert_eq!(dotted.name, "users.v2");
    assert_eq!(dotted.kind, FragmentKind::Sql);

    let accented = FragmentName::parse("00002_créer utilisateurs_down.sql").unwrap();
    assert_eq!(accented.name, "créer utilisateurs");
    assert_eq!(accented.direction, Direction::Down);
}

#[test]
fn test_file_name_is_zero_padded() {
    let name = FragmentName::new(
        7,
        MigrationName::new("add_index"),
        Direction::Down,
        FragmentKind::Script,
    );
    assert_eq!(name.file_name(), "00007_add_index_down.sh");
    assert_eq!(FragmentName::parse(&name.file_name()).unwrap(), name);
}

#[test]
fn test_leading_version() {
    assert_eq!(leading_version("00042_x_up.sql"), Some(42));
    assert_eq!(leading_version("README.md"), None);
}

#[test]
fn test_script_path_falls_back_to_identifier() {
    let fragment = ScriptFragment::new("00001_seed_up.sh", "");
    assert_eq!(fragment.script_path(), PathBuf::from("00001_seed_up.sh"));
    let fragment = fragment.with_path("/srv/migrations/00001_seed_up.sh");
    assert_eq!(
        fragment.script_path(),
        PathBuf::from("/srv/migrations/00001_seed_up.sh")
    );
}
