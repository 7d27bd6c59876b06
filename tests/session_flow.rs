use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn finley_cmd(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("finley"));
    cmd.env("FINLEY_HOME", home.path());
    cmd.env_remove("FINLEY_API_URL");
    cmd.env_remove("FINLEY_PASSWORD");
    cmd
}

fn run_ok_out(home: &tempfile::TempDir, args: &[&str]) -> String {
    let mut cmd = finley_cmd(home);
    cmd.args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).expect("utf8 stdout")
}

#[test]
fn status_without_a_session_reports_logged_out() {
    let home = tempfile::tempdir().expect("tempdir");

    let out = run_ok_out(&home, &["status"]);
    assert!(out.contains("Not logged in."));
    assert!(out.contains("Display currency: VND"));
}

#[test]
fn logout_without_a_session_is_a_noop() {
    let home = tempfile::tempdir().expect("tempdir");

    let out = run_ok_out(&home, &["logout"]);
    assert!(out.contains("No active session."));
}

#[test]
fn currency_toggle_flips_and_persists_across_invocations() {
    let home = tempfile::tempdir().expect("tempdir");

    let out = run_ok_out(&home, &["currency", "toggle"]);
    assert!(out.contains("Display currency is now AUD"));

    // Second process reads the persisted config.
    let status = run_ok_out(&home, &["currency", "status"]);
    assert!(status.contains("Display currency: AUD"));
    // AUD is the storage currency, so no conversion note.
    assert!(!status.contains("converted for display"));

    let back = run_ok_out(&home, &["currency", "toggle"]);
    assert!(back.contains("Display currency is now VND"));

    let status = run_ok_out(&home, &["currency", "status"]);
    assert!(status.contains("Display currency: VND"));
    assert!(status.contains("stored in AUD"));
}

#[test]
fn offline_convert_multiplies_by_the_given_rate() {
    let home = tempfile::tempdir().expect("tempdir");

    let out = run_ok_out(&home, &["convert", "2", "--rate", "16500"]);
    assert!(out.contains("2 AUD = 33000.00 VND (rate 16500)"));
}

#[test]
fn offline_convert_respects_currency_arguments() {
    let home = tempfile::tempdir().expect("tempdir");

    let out = run_ok_out(
        &home,
        &["convert", "10", "--from", "vnd", "--to", "aud", "--rate", "0.00006"],
    );
    assert!(out.contains("10 VND = 0.00 AUD (rate 0.00006)"));
}

#[test]
fn offline_convert_rejects_non_positive_rates() {
    let home = tempfile::tempdir().expect("tempdir");

    finley_cmd(&home)
        .args(["convert", "2", "--rate", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rate must be positive"));
}

#[test]
fn offline_convert_rejects_history_and_chart() {
    let home = tempfile::tempdir().expect("tempdir");

    finley_cmd(&home)
        .args(["convert", "2", "--rate", "16500", "--history"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rate only applies"));
}

#[test]
fn backend_commands_require_a_login() {
    let home = tempfile::tempdir().expect("tempdir");

    for args in [
        vec!["dashboard"],
        vec!["tx", "list"],
        vec!["budget", "list"],
        vec!["settings", "show"],
    ] {
        finley_cmd(&home)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not logged in"));
    }
}

#[test]
fn dashboard_validates_the_month_before_touching_the_network() {
    let home = tempfile::tempdir().expect("tempdir");

    // No session yet, so the session check fires first; after writing a fake
    // session the month check is the next gate.
    std::fs::create_dir_all(home.path().join("config")).unwrap();
    std::fs::write(
        home.path().join("config").join("session.json"),
        r#"{"user":{"token":"t","userId":1,"name":"Test","email":"t@example.com"},"loggedInAt":"2025-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    finley_cmd(&home)
        .args(["dashboard", "--month", "13"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Month must be between 1 and 12"));
}
