use super::*;

#[test]
fn test_status_round_trips_through_str() {
    for status in MigrationStatus::ALL {
        assert_eq!(status.as_str().parse::<MigrationStatus>().unwrap(), status);
    }
    assert!("pending".parse::<MigrationStatus>().is_err());
}

#[test]
fn test_process_follows_absent_cancel_or_error() {
    assert!(MigrationStatus::Process.can_follow(None));
    assert!(MigrationStatus::Process.can_follow(Some(MigrationStatus::Cancel)));
    assert!(MigrationStatus::Process.can_follow(Some(MigrationStatus::Error)));
    assert!(!MigrationStatus::Process.can_follow(Some(MigrationStatus::Success)));
    assert!(!MigrationStatus::Process.can_follow(Some(MigrationStatus::Process)));
    assert!(!MigrationStatus::Process.can_follow(Some(MigrationStatus::Cancellation)));
}

#[test]
fn test_cancellation_requires_success_or_error() {
    assert!(MigrationStatus::Cancellation.can_follow(Some(MigrationStatus::Success)));
    assert!(MigrationStatus::Cancellation.can_follow(Some(MigrationStatus::Error)));
    assert!(!MigrationStatus::Cancellation.can_follow(None));
    assert!(!MigrationStatus::Cancellation.can_follow(Some(MigrationStatus::Cancel)));
}

#[test]
fn test_terminal_states_follow_their_transient_state() {
    assert!(MigrationStatus::Success.can_follow(Some(MigrationStatus::Process)));
    assert!(!MigrationStatus::Success.can_follow(Some(MigrationStatus::Cancellation)));
    assert!(MigrationStatus::Cancel.can_follow(Some(MigrationStatus::Cancellation)));
    assert!(!MigrationStatus::Cancel.can_follow(Some(MigrationStatus::Process)));
    assert!(MigrationStatus::Error.can_follow(Some(MigrationStatus::Process)));
    assert!(MigrationStatus::Error.can_follow(Some(MigrationStatus::Cancellation)));
    assert!(!MigrationStatus::Error.can_follow(None));
}

#[test]
fn test_direction_states() {
    assert_eq!(Direction::Up.in_flight(), MigrationStatus::Process);
    assert_eq!(Direction::Up.completed(), MigrationStatus::Success);
    assert_eq!(Direction::Down.in_flight(), MigrationStatus::Cancellation);
    assert_eq!(Direction::Down.completed(), MigrationStatus::Cancel);
    assert_eq!(Direction::Down.failed(), MigrationStatus::Error);
    assert!(Direction::Up.in_flight().is_transient());
    assert!(!Direction::Down.completed().is_transient());
}
