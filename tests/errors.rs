use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    Command::cargo_bin("bfi").unwrap()
}

#[test]
fn lone_close_bracket_reports_unmatched() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("]")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unmatched bracket"))
        .stderr(predicate::str::contains("']' without a matching '['"));
}

#[test]
fn unclosed_bracket_with_zero_guard_reports_unmatched() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("[")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'[' without a matching ']'"));
}

#[test]
fn active_unclosed_bracket_is_not_an_error() {
    // The guard is non-zero so the '[' is pushed, never scanned; running
    // off the end of the program with it active succeeds.
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("+[")
        .assert()
        .success()
        .stdout("\n");
}

#[test]
fn tape_underflow_reports_position_with_caret() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("++<")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("tape underflow"))
        .stderr(predicate::str::contains("at instruction 2"))
        .stderr(predicate::str::contains("^"));
}

#[test]
fn program_output_stays_on_stdout_errors_on_stderr() {
    // Two bytes make it out before the underflow aborts the run.
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("+.+.<")
        .assert()
        .failure()
        .stdout("\u{1}\u{2}")
        .stderr(predicate::str::contains("tape underflow"));
}
