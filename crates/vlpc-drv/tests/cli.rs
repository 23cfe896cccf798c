use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("vlpc")
        .unwrap()
        .current_dir(dir.path())
        .arg("missing.vlp")
        .assert()
        .failure();
}

#[test]
fn syntax_error_exits_with_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.vlp");
    fs::write(&source, "fx broken(").unwrap();

    Command::cargo_bin("vlpc")
        .unwrap()
        .current_dir(dir.path())
        .arg("broken.vlp")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn clean_removes_generated_artifacts_without_requiring_a_toolchain() {
    let dir = tempfile::tempdir().unwrap();
    let stem_ll = dir.path().join("main.ll");
    let output = dir.path().join("a.out");
    fs::write(&stem_ll, "; stale ir\n").unwrap();
    fs::write(&output, "stale binary").unwrap();

    Command::cargo_bin("vlpc")
        .unwrap()
        .current_dir(dir.path())
        .arg("main.vlp")
        .arg("--clean")
        .assert()
        .success();

    assert!(!stem_ll.exists());
    assert!(!output.exists());
}
