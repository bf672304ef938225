//! Integration tests for CLI config file discovery: explicit `--config`,
//! auto-discovery walking parent directories, and `CVINTEL_*` environment
//! overrides.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn get_binary_path() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{}/../../target/debug/cvintel", manifest_dir)
}

fn build_binary() {
    let status = Command::new("cargo").args(["build", "--bin", "cvintel"]).status().expect("failed to build cvintel binary");
    assert!(status.success(), "failed to build cvintel binary");
}

#[test]
fn discovers_cvintel_toml_in_current_directory() {
    build_binary();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cvintel.toml"), "app_name = \"discovered\"\nport = 9999\n").unwrap();

    let output =
        Command::new(get_binary_path()).arg("config").current_dir(dir.path()).output().expect("failed to execute config command");

    assert!(output.status.success(), "config command failed: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("config output was not valid JSON");
    assert_eq!(parsed["app_name"], "discovered");
    assert_eq!(parsed["port"], 9999);
}

#[test]
fn discovers_cvintel_toml_from_a_nested_subdirectory() {
    build_binary();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cvintel.toml"), "app_name = \"discovered-from-parent\"\n").unwrap();
    let nested = dir.path().join("a/b/c");
    fs::create_dir_all(&nested).unwrap();

    let output = Command::new(get_binary_path()).arg("config").current_dir(&nested).output().expect("failed to execute config command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("config output was not valid JSON");
    assert_eq!(parsed["app_name"], "discovered-from-parent");
}

#[test]
fn explicit_config_flag_takes_precedence_over_discovery() {
    build_binary();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cvintel.toml"), "app_name = \"ambient\"\n").unwrap();
    let explicit_path = dir.path().join("explicit.json");
    fs::write(&explicit_path, r#"{"app_name": "explicit"}"#).unwrap();

    let output = Command::new(get_binary_path())
        .args(["config", "--config", explicit_path.to_str().unwrap()])
        .current_dir(dir.path())
        .output()
        .expect("failed to execute config command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("config output was not valid JSON");
    assert_eq!(parsed["app_name"], "explicit");
}

#[test]
fn cvintel_env_override_takes_precedence_over_file() {
    build_binary();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cvintel.toml"), "port = 1111\n").unwrap();

    let output = Command::new(get_binary_path())
        .arg("config")
        .current_dir(dir.path())
        .env("CVINTEL_PORT", "2222")
        .output()
        .expect("failed to execute config command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("config output was not valid JSON");
    assert_eq!(parsed["port"], 2222);
}
