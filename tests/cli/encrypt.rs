//! Tests for `cue-sops encrypt`.

use crate::support::*;

#[test]
fn test_encrypt_replaces_secret_values_only() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);

    let output = t.encrypt("service.cue");
    assert_success(&output);
    assert_stdout_contains(&output, "encrypted 3 fields");

    let enc = t.read("service.cue");
    assert!(!enc.contains("tok-123"));
    assert!(!enc.contains("p@ss"));
    assert!(!enc.contains("BEGIN CERT"));
    assert!(enc.contains("name:    \"billing\""));
    assert!(enc.contains("\thost: \"db.internal\" // resolved by DNS\n"));
    assert!(enc.contains("tags: [\"a\", \"b\"]"));
    assert!(enc.contains("token: \"ENC[AES256_GCM,data:"));
    assert!(enc.contains("@secret(sops)"));
}

#[test]
fn test_encrypt_appends_metadata_block() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    let enc = t.read("service.cue");
    assert!(enc.contains("\n// DO NOT EDIT: auto-generated by cue-sops\nsops: {\n"));
    assert!(enc.contains(&format!("recipient: \"{}\"", t.recipient())));
    assert!(enc.contains("encrypted_selector: \"db.password|tls|token\""));
    assert!(enc.contains("-----BEGIN AGE ENCRYPTED FILE-----"));
}

#[test]
fn test_encrypt_twice_is_a_no_op() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));
    let first = t.read("service.cue");

    let output = t.encrypt("service.cue");
    assert_exit_code(&output, 0);
    assert_stdout_contains(&output, "already encrypted");
    assert_eq!(t.read("service.cue"), first);
}

#[test]
fn test_encrypt_without_secrets_adds_metadata() {
    let t = Test::new();
    t.write("plain.cue", PLAIN_CUE);

    assert_success(&t.encrypt("plain.cue"));
    let enc = t.read("plain.cue");
    assert!(enc.starts_with(PLAIN_CUE));
    assert!(enc.contains("sops: {"));
}

#[test]
fn test_encrypt_in_subdirectory_finds_policy() {
    let t = Test::new();
    t.write("env/prod/service.cue", SERVICE_CUE);

    assert_success(&t.encrypt("env/prod/service.cue"));
    assert!(t.read("env/prod/service.cue").contains("sops: {"));
}

#[test]
fn test_encrypt_with_explicit_config() {
    let t = Test::bare();
    t.write("policies/cue.yaml", &policy(&[&t.recipient()]));
    t.write("service.cue", SERVICE_CUE);

    let output = t
        .cmd()
        .args(["encrypt", "service.cue", "--config", "policies/cue.yaml"])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t
        .cmd()
        .env("CUE_SOPS_CONFIG", "policies/cue.yaml")
        .args(["decrypt", "service.cue"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_encrypt_for_multiple_recipients() {
    let t = Test::bare();
    let other = age::x25519::Identity::generate();
    t.write(
        ".sops.yaml",
        &policy(&[&t.recipient(), &other.to_public().to_string()]),
    );
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    // The second recipient can decrypt on its own.
    t.write("other.txt", &identity_file(&other));
    let output = t
        .cmd()
        .env("SOPS_AGE_KEY_FILE", t.dir.path().join("other.txt"))
        .args(["decrypt", "service.cue"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_encrypt_honors_unencrypted_suffix() {
    let t = Test::new();
    t.write(
        "app.cue",
        "db: {\n\tpassword: \"p\"\n\thost_unencrypted: \"h\"\n} @secret()\n",
    );
    assert_success(&t.encrypt("app.cue"));

    let enc = t.read("app.cue");
    assert!(enc.contains("\thost_unencrypted: \"h\"\n"));
    assert!(!enc.contains("password: \"p\""));
}
