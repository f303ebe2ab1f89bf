use assert_cmd::cargo::{self};
use predicates::str::contains;

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!("editdesk");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("editdesk"))
        .stdout(contains("layout"))
        .stdout(contains("settings"));
}

#[test]
fn layout_help_lists_field_commands() {
    let mut cmd = cargo::cargo_bin_cmd!("editdesk");
    cmd.args(["layout", "--help"])
        .assert()
        .success()
        .stdout(contains("add-field"))
        .stdout(contains("move-field"));
}
