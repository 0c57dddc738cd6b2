//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// `promptfmt` command isolated from the user's config and environment.
///
/// The returned directory doubles as the working directory and the config
/// home, so keep it alive for as long as the command is used.
pub fn promptfmt() -> (Command, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let mut cmd = Command::cargo_bin("promptfmt").expect("promptfmt binary");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("PROMPTFMT_CONFIG")
        .env_remove("PROMPTFMT_DETECTION_PROFILE")
        .env_remove("PROMPTFMT_HEURISTIC_FALLBACK")
        .env_remove("PROMPTFMT_QUALITY_GATE")
        .env_remove("PROMPTFMT_DEFAULT_TEMPLATE")
        .env_remove("PROMPTFMT_VALIDATION_THRESHOLD");
    (cmd, dir)
}

/// Parse stdout as a single JSON document.
pub fn stdout_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("invalid JSON ({e}):\n{text}"))
}

pub fn assert_plain_output(output: &[u8], label: &str) {
    let text = String::from_utf8_lossy(output);
    assert!(
        !text.contains('\x1b'),
        "{label} contains ANSI escape codes:\n{text}"
    );
}
