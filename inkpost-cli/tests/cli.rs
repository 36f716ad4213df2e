use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_subcommands() {
    Command::cargo_bin("inkpost-cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("register")
                .and(predicate::str::contains("login"))
                .and(predicate::str::contains("comment")),
        );
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("inkpost-cli")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}

#[test]
fn create_requires_its_arguments() {
    Command::cargo_bin("inkpost-cli")
        .unwrap()
        .arg("create")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--title"));
}
