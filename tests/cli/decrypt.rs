//! Tests for `cue-sops decrypt`.

use crate::support::*;

#[test]
fn test_roundtrip_restores_file_exactly() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);

    assert_success(&t.encrypt("service.cue"));
    assert_ne!(t.read("service.cue"), SERVICE_CUE);

    let output = t.decrypt("service.cue");
    assert_success(&output);
    assert_stdout_contains(&output, "decrypted 3 fields");
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_decrypt_does_not_need_policy() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    std::fs::remove_file(t.dir.path().join(".sops.yaml")).unwrap();
    assert_success(&t.decrypt("service.cue"));
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_decrypt_with_inline_identity() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    let output = t
        .cmd()
        .env_remove("SOPS_AGE_KEY_FILE")
        .env("SOPS_AGE_KEY", identity_file(&t.identity))
        .args(["decrypt", "service.cue"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
#[cfg(target_os = "linux")]
fn test_decrypt_with_default_key_file() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    let config = t.home.path().join(".config").join("sops").join("age");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("keys.txt"), identity_file(&t.identity)).unwrap();

    let output = t
        .cmd()
        .env_remove("SOPS_AGE_KEY_FILE")
        .args(["decrypt", "service.cue"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("service.cue"), SERVICE_CUE);
}

#[test]
fn test_decrypt_unprotected_file_exits_one() {
    let t = Test::new();
    t.write("plain.cue", PLAIN_CUE);

    let output = t.decrypt("plain.cue");
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "not encrypted");
    assert_eq!(t.read("plain.cue"), PLAIN_CUE);
}

#[test]
fn test_decrypt_with_wrong_identity_fails() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));
    let enc = t.read("service.cue");

    let stranger = age::x25519::Identity::generate();
    t.write("stranger.txt", &identity_file(&stranger));
    let output = t
        .cmd()
        .env("SOPS_AGE_KEY_FILE", t.dir.path().join("stranger.txt"))
        .args(["decrypt", "service.cue"])
        .output()
        .unwrap();
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "recover the data key");
    assert_eq!(t.read("service.cue"), enc);
}

#[test]
fn test_decrypt_detects_tampering() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    let enc = t.read("service.cue");
    let tampered = enc.replacen("lastmodified: \"", "lastmodified: \"1", 1);
    t.write("service.cue", &tampered);

    let output = t.decrypt("service.cue");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "message authentication code mismatch");
    assert_eq!(t.read("service.cue"), tampered);
}

#[test]
fn test_plain_fields_may_change_while_encrypted() {
    let t = Test::new();
    t.write("service.cue", SERVICE_CUE);
    assert_success(&t.encrypt("service.cue"));

    let edited = t.read("service.cue").replacen("replicas: 3", "replicas: 5", 1);
    t.write("service.cue", &edited);

    assert_success(&t.decrypt("service.cue"));
    assert_eq!(
        t.read("service.cue"),
        SERVICE_CUE.replacen("replicas: 3", "replicas: 5", 1)
    );
}
