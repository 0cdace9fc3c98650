use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_names_the_pipeline() {
    let mut cmd = Command::cargo_bin("repo-report").expect("binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("repo-report"));
}

#[test]
fn run_with_missing_config_file_fails_with_config_exit_code() {
    let mut cmd = Command::cargo_bin("repo-report").expect("binary exists");
    cmd.arg("run")
        .arg("--config")
        .arg("/definitely/not/a/config.yaml");
    cmd.assert().failure().code(1);
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("repo-report").expect("binary exists");
    cmd.assert().failure();
}
