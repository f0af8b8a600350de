//! Tests for usage errors and failure handling.

use crate::support::*;

#[test]
fn test_help() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("Usage"));
    assert!(out.contains("encrypt"));
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_missing_arguments_exit_two() {
    let t = Test::new();

    assert_exit_code(&t.cmd().output().unwrap(), 2);
    assert_exit_code(&t.cmd().arg("encrypt").output().unwrap(), 2);
    assert_exit_code(
        &t.cmd().args(["encrypt", "a.cue", "b.cue"]).output().unwrap(),
        2,
    );
}

#[test]
fn test_unknown_operation_fails_before_io() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);

    let output = t.cmd().args(["rotate", "service.cue"]).output().unwrap();
    assert_exit_code(&output, 2);
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_missing_file() {
    let t = Test::new();

    let output = t.encrypt("absent.cue");
    assert_exit_code(&output, 2);
    assert!(!t.dir.path().join("absent.cue").exists());
}

#[test]
fn test_invalid_document_left_untouched() {
    let t = Test::new();
    t.write("bad.cue", INVALID_CUE);

    let output = t.encrypt("bad.cue");
    assert_exit_code(&output, 2);
    assert_eq!(t.read("bad.cue"), INVALID_CUE);
}

#[test]
fn test_missing_policy_fails_and_keeps_file() {
    let t = Test::bare();
    t.write("service.cue", SERVICE_CUE);

    let output = t.encrypt("service.cue");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, ".sops.yaml");
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_policy_without_matching_rule() {
    let t = Test::bare();
    t.write(
        ".sops.yaml",
        &format!("creation_rules:\n  - path_regex: \\.yaml$\n    age: {}\n", t.recipient()),
    );
    t.write("service.cue", SERVICE_CUE);

    let output = t.encrypt("service.cue");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "no creation rule matches service.cue");
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_secret_inside_list_rejected() {
    let t = Test::new();
    let src = "users: [{name: \"a\", pw: \"x\" @secret()}]\n";
    t.write("list.cue", src);

    let output = t.encrypt("list.cue");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "inside a list");
    assert_eq!(t.read("list.cue"), src);
}

#[test]
fn test_invalid_recipient_rejected() {
    let t = Test::bare();
    t.write(
        ".sops.yaml",
        "creation_rules:\n  - age: age1notarealkey\n",
    );
    t.write("service.cue", SERVICE_CUE);

    let output = t.encrypt("service.cue");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "invalid age recipient");
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_stranger_can_encrypt_but_not_decrypt() {
    let t = Test::bare();
    t.write(".sops.yaml", &policy(&[STRANGER_PUBLIC_KEY]));
    t.write("service.cue", SERVICE_CUE);

    assert_success(&t.encrypt("service.cue"));
    let output = t.decrypt("service.cue");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "SOPS_AGE_KEY_FILE");
}
