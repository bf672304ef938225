//! Integration tests for CLI commands (extract, config).
//!
//! These exercise the built `cvintel` binary end-to-end: input validation,
//! text extraction without the OCR backend compiled in, and config
//! printing.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

/// Path to the built binary, matching the crate's own target directory.
fn get_binary_path() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{}/../../target/debug/cvintel", manifest_dir)
}

/// Build the binary before running tests.
fn build_binary() {
    let status = Command::new("cargo").args(["build", "--bin", "cvintel"]).status().expect("failed to build cvintel binary");
    assert!(status.success(), "failed to build cvintel binary");
}

#[test]
fn extract_rejects_missing_file() {
    build_binary();

    let output = Command::new(get_binary_path()).args(["extract", "/no/such/file.pdf"]).output().expect("failed to execute extract command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found") || stderr.contains("no such"), "unexpected stderr: {stderr}");
}

#[test]
fn extract_falls_back_to_plain_text_for_unrecognised_extensions() {
    build_binary();

    let dir = tempdir().unwrap();
    let file_path = dir.path().join("resume.txt");
    fs::write(&file_path, "Jane Doe\nEmail: jane.doe@example.com\n").unwrap();

    let output = Command::new(get_binary_path())
        .args(["extract", file_path.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("failed to execute extract command");

    assert!(output.status.success(), "extract command failed: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("extract output was not valid JSON");
    assert_eq!(parsed["tier1"]["email"]["value"], "jane.doe@example.com");
}

#[test]
fn config_command_prints_json_with_defaults() {
    build_binary();

    let output = Command::new(get_binary_path()).arg("config").output().expect("failed to execute config command");

    assert!(output.status.success(), "config command failed: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("config output was not valid JSON");
    assert!(parsed.get("app_name").is_some());
    assert!(parsed.get("port").is_some());
}

#[test]
fn config_command_rejects_missing_config_file() {
    build_binary();

    let output =
        Command::new(get_binary_path()).args(["config", "--config", "/no/such/cvintel.toml"]).output().expect("failed to execute config command");

    assert!(!output.status.success());
}
