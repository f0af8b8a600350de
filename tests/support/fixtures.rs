//! Test fixtures and constants.

/// A document with secrets at the root, nested, and inside a secret struct.
pub const SERVICE_CUE: &str = r#"package service

// Service settings; only credentials are secret.
name:    "billing"
replicas: 3

token: "tok-123" @secret()

db: {
	host: "db.internal" // resolved by DNS
	port: 5432
	password: "p@ss, \"quoted\"" @secret(sops)
}

tls: {
	cert: "-----BEGIN CERT-----"
	key:  "-----BEGIN KEY-----"
} @secret()

tags: ["a", "b"]
"#;

/// A document without any secret fields.
pub const PLAIN_CUE: &str = "package plain\n\nname: \"x\"\n";

/// A document the parser rejects.
pub const INVALID_CUE: &str = "name: \"x\"\nbroken: {\n";

/// A valid age public key nobody in the tests holds the identity for.
pub const STRANGER_PUBLIC_KEY: &str =
    "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// Policy encrypting every `.cue` file for the given recipients.
pub fn policy(recipients: &[&str]) -> String {
    format!(
        "creation_rules:\n  - path_regex: \\.cue$\n    age: {}\n",
        recipients.join(",")
    )
}
