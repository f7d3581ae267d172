use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn help_lists_the_modes() {
    Command::cargo_bin("linkmon")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--feed"))
        .stdout(contains("--json"));
}
