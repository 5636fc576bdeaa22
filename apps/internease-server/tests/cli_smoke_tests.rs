//! CLI smoke tests for the internease-server binary
//!
//! These tests drive the compiled binary: help output, configuration
//! validation and short server runs against an in-memory database.

use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

/// Helper to run the internease-server binary with given arguments
fn run_internease_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_internease-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute internease-server")
}

/// Helper to run the internease-server binary with timeout
async fn run_internease_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_internease-server"));
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

fn write_config(dir: &TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("Failed to write config file");
    path.to_str().unwrap().to_owned()
}

fn minimal_config(home: &TempDir, extra: &str) -> String {
    format!(
        r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: 0

logging:
  default:
    console_level: "off"
    file: ""
{extra}"#,
        home.path().display().to_string().replace('\\', "/")
    )
}

#[test]
fn test_cli_help_command() {
    let output = run_internease_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("internease-server") || stdout.contains("InternEase"),
        "Should contain binary name"
    );
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(
        stdout.contains("reset-password"),
        "Should contain 'reset-password' subcommand"
    );
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_internease_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("internease-server"), "Should contain binary name");
    assert!(
        stdout.chars().any(|c| c.is_ascii_digit()),
        "Should contain version numbers"
    );
}

#[test]
fn test_cli_invalid_command() {
    let output = run_internease_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid") || stderr.contains("unexpected"),
        "Should contain error message about invalid command"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_internease_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config file not found"),
        "Should mention config file issue: {}",
        stderr
    );
}

#[test]
fn test_cli_config_flag_short_form() {
    let output = run_internease_server(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(
        !output.status.success(),
        "Should fail with missing config file"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config"),
        "Should mention config file issue with short flag: {}",
        stderr
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "invalid.yaml",
        "invalid: yaml: content: [unclosed",
    );

    let output = run_internease_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config"),
        "Should mention configuration parsing issue: {}",
        stderr
    );
}

#[test]
fn test_cli_unknown_section_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    let config_path = write_config(
        &temp_dir,
        "unknown.yaml",
        &minimal_config(&home, "frobnicate:\n  level: 3\n"),
    );

    let output = run_internease_server(&["--config", &config_path, "check"]);

    assert!(
        !output.status.success(),
        "Unknown top-level sections should be rejected"
    );
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    let config_path = write_config(
        &temp_dir,
        "valid.yaml",
        &minimal_config(&home, "database:\n  url: \"sqlite://database/test.db\"\n"),
    );

    let output = run_internease_server(&["--config", &config_path, "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
    }
    assert!(output.status.success(), "Should succeed with valid config");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Configuration is valid"),
        "Should indicate successful validation: {}",
        stdout
    );
    assert!(stdout.contains("sqlite://database/test.db"), "{}", stdout);
}

#[test]
fn test_cli_production_requires_secret() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    let body = minimal_config(&home, "").replace(
        "  port: 0\n",
        "  port: 0\n  environment: production\n",
    );
    let config_path = write_config(&temp_dir, "prod.yaml", &body);

    let output = run_internease_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Production without a secret must fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("jwt_secret"), "{}", stderr);
}

#[test]
fn test_cli_print_config_applies_overrides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    let config_path = write_config(&temp_dir, "print.yaml", &minimal_config(&home, ""));

    let output = run_internease_server(&[
        "--config",
        &config_path,
        "--port",
        "8123",
        "--mock",
        "--print-config",
    ]);

    assert!(output.status.success(), "print-config should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 8123"), "{}", stdout);
    assert!(stdout.contains("sqlite::memory:"), "{}", stdout);
}

#[test]
fn test_cli_mock_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    // The PostgreSQL URL is replaced by an in-memory database.
    let config_path = write_config(
        &temp_dir,
        "mock.yaml",
        &minimal_config(
            &home,
            "database:\n  url: \"postgresql://localhost/nonexistent\"\n",
        ),
    );

    let output = run_internease_server(&["--config", &config_path, "--mock", "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
    }
    assert!(
        output.status.success(),
        "Should succeed with mock database even if PostgreSQL config is invalid"
    );
}

#[tokio::test]
async fn test_cli_run_command_with_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    let config_path = write_config(&temp_dir, "run.yaml", &minimal_config(&home, ""));

    let result = run_internease_server_with_timeout(
        &["--config", &config_path, "--mock", "run"],
        Duration::from_secs(10),
    )
    .await;

    // A running server outlives the timeout.
    match result {
        Err(err) => {
            assert!(
                err.to_string().contains("elapsed"),
                "Server failed to start: {}",
                err
            );
        }
        Ok(output) => {
            assert!(
                output.status.success(),
                "Server should start successfully.\nSTDOUT: {}\nSTDERR: {}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }
}

#[test]
fn test_cli_reset_password_for_unknown_account() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create home dir");
    let config_path = write_config(
        &temp_dir,
        "reset.yaml",
        &minimal_config(&home, "database:\n  url: \"sqlite://database/reset.db\"\n"),
    );

    let output = run_internease_server(&[
        "--config",
        &config_path,
        "reset-password",
        "--email",
        "nobody@example.com",
        "--password",
        "new-secret-1",
    ]);

    assert!(
        !output.status.success(),
        "Resetting a missing account should fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nobody@example.com"), "{}", stderr);
}

#[test]
fn test_cli_reset_password_requires_arguments() {
    let output = run_internease_server(&["reset-password", "--email", "a@b.c"]);

    assert!(!output.status.success(), "Missing --password should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--password"), "{}", stderr);
}

#[test]
fn test_cli_verbose_flag() {
    let output = run_internease_server(&["--verbose", "--help"]);

    assert!(output.status.success(), "Verbose help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should still contain usage information"
    );
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_internease_server(&["run", "--help"]);
    assert!(
        output.status.success(),
        "Run subcommand help should succeed"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("run") || stdout.contains("server"),
        "Should contain information about run command"
    );

    let output = run_internease_server(&["check", "--help"]);
    assert!(
        output.status.success(),
        "Check subcommand help should succeed"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("check") || stdout.contains("configuration"),
        "Should contain information about check command"
    );
}
