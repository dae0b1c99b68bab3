//! CLI integration tests

use std::process::{Command, Output};

fn cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kubectl-application-shell"))
        .args(args)
        .env_remove("KUBERNETES_SERVICE_HOST")
        .env_remove("KUBERNETES_SERVICE_PORT")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Deployment's first container"),
        "Should describe the tool"
    );
    assert!(stdout.contains("<NAMESPACE>"), "Should show namespace argument");
    assert!(stdout.contains("<DEPLOYMENT>"), "Should show deployment argument");
    assert!(stdout.contains("--image"), "Should show image option");
    assert!(stdout.contains("--shell"), "Should show shell option");
    assert!(stdout.contains("--args"), "Should show args option");
    assert!(stdout.contains("--run"), "Should show run option");
    assert!(stdout.contains("--context"), "Should show context option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(
        stdout.contains("kubectl-application-shell"),
        "Should show binary name"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = cli(&["payments"]);

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}

/// Test invalid option error handling
#[test]
fn test_invalid_option() {
    let output = cli(&["payments", "api", "--no-such-flag"]);

    assert!(!output.status.success(), "Invalid option should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should show error message");
}

/// Test that an unusable cluster configuration exits with 1 before printing a command
#[test]
fn test_unusable_kubeconfig_exits_with_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let kubeconfig = temp_dir.path().join("missing-kubeconfig");
    let cache_dir = temp_dir.path().join("cache");

    let output = cli(&[
        "payments",
        "api",
        "--kubeconfig",
        kubeconfig.to_str().unwrap(),
        "--cache-dir",
        cache_dir.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1), "Should exit with 1");
    assert!(output.stdout.is_empty(), "No command should be printed");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no usable cluster configuration"),
        "Should explain the configuration failure: {}",
        stderr
    );
    assert!(!cache_dir.exists(), "Nothing should be cached");
}

/// Test that a missing explicit config file is reported
#[test]
fn test_missing_config_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = temp_dir.path().join("nope.toml");

    let output = cli(&["payments", "api", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config"), "Should mention the config file");
}
