use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn finley_cmd(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("finley"));
    cmd.env("FINLEY_HOME", home.path());
    cmd.env_remove("FINLEY_API_URL");
    cmd
}

// Rule arguments are validated before any request goes out, so these flows
// run against a fake session with no backend at all.
fn write_fake_session(home: &tempfile::TempDir) {
    std::fs::create_dir_all(home.path().join("config")).unwrap();
    std::fs::write(
        home.path().join("config").join("session.json"),
        r#"{"user":{"token":"t","userId":1,"name":"Test","email":"t@example.com"},"loggedInAt":"2025-01-01T00:00:00Z"}"#,
    )
    .unwrap();
}

#[test]
fn custom_rules_require_both_dates() {
    let home = tempfile::tempdir().expect("tempdir");
    write_fake_session(&home);

    finley_cmd(&home)
        .args([
            "rule", "create", "--category", "1", "--event", "custom", "--adjustment",
            "percentage", "--value", "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Custom rules require --start"));

    finley_cmd(&home)
        .args([
            "rule", "create", "--category", "1", "--event", "custom", "--adjustment",
            "percentage", "--value", "10", "--start", "2025-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Custom rules require --end"));
}

#[test]
fn custom_rule_window_must_not_be_inverted() {
    let home = tempfile::tempdir().expect("tempdir");
    write_fake_session(&home);

    finley_cmd(&home)
        .args([
            "rule", "create", "--category", "1", "--event", "custom", "--adjustment",
            "fixed_amount", "--value=-50", "--start", "2025-02-01", "--end", "2025-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("end date is before its start date"));
}

#[test]
fn event_rules_reject_explicit_dates() {
    let home = tempfile::tempdir().expect("tempdir");
    write_fake_session(&home);

    finley_cmd(&home)
        .args([
            "rule", "create", "--category", "1", "--event", "exam_week", "--adjustment",
            "percentage", "--value=-20", "--start", "2025-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only custom rules take --start/--end"));
}

#[test]
fn unknown_event_and_adjustment_names_are_rejected() {
    let home = tempfile::tempdir().expect("tempdir");
    write_fake_session(&home);

    finley_cmd(&home)
        .args([
            "rule", "create", "--category", "1", "--event", "winter_break", "--adjustment",
            "percentage", "--value", "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown event 'winter_break'"));

    finley_cmd(&home)
        .args([
            "rule", "create", "--category", "1", "--event", "custom", "--adjustment",
            "doubling", "--value", "10", "--start", "2025-01-01", "--end", "2025-01-31",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown adjustment 'doubling'"));
}

#[test]
fn points_conversion_is_validated_client_side() {
    let home = tempfile::tempdir().expect("tempdir");
    write_fake_session(&home);

    finley_cmd(&home)
        .args(["settings", "convert-points", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("At least 100 points"));

    finley_cmd(&home)
        .args(["settings", "convert-points", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("multiple of 100"));
}
