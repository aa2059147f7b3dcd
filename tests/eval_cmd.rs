use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cargo_bin() -> Command {
    Command::cargo_bin("bfi").unwrap()
}

#[test]
fn counter_loop_prints_letter_a() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("++++++[>++++++++++<-]>+++++.")
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn reads_from_stdin_and_echoes_byte() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg(",.")
        .write_stdin("Z")
        .assert()
        .success()
        .stdout("Z\n");
}

#[test]
fn comment_bytes_are_ignored() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("+ add two! +.")
        .assert()
        .success()
        .stdout("\u{2}\n");
}

#[test]
fn exhausted_stdin_leaves_cell_unchanged() {
    // ',' on empty stdin must not zero the cell set up by '+++'.
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("+++,.")
        .assert()
        .success()
        .stdout("\u{3}\n");
}

#[test]
fn positional_code_parts_are_concatenated() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("++")
        .arg("+.")
        .assert()
        .success()
        .stdout("\u{3}\n");
}

#[test]
fn loads_code_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"++++++[>++++++++++<-]>+++++.").unwrap();

    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("--file")
        .arg(file.path())
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn missing_code_is_a_usage_error() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn file_and_positional_code_conflict() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("eval")
        .arg("--file")
        .arg("whatever.bf")
        .arg("+.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot use positional code"));
}
