//! End-to-end tests of the compspec binary

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::*;
use std::fs;

const SERVICE_SPEC: &str = "@command svc :svc\n@label :svc\n  @switch\n    \
    start|stop|restart # lifecycle action\n    status\n";

#[test]
fn test_version_flag() {
    let home = create_temp_dir();
    let output = test_command(home.path())
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(PKG_VERSION));
}

#[test]
fn test_complete_from_spec_path() {
    let home = create_temp_dir();
    let spec = create_spec(home.path(), "svc.spec", SERVICE_SPEC);

    let output = test_command(home.path())
        .arg(&spec)
        .args(["svc", "st"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "start #\"lifecycle action\"\nstatus\nstop #\"lifecycle action\"\n"
    );
}

#[test]
fn test_spec_name_resolved_in_spec_dir() {
    let home = create_temp_dir();
    let spec_dir = home.path().join("spec");
    fs::create_dir(&spec_dir).unwrap();
    create_spec(&spec_dir, "svc.spec", SERVICE_SPEC);

    let output = test_command(home.path())
        .current_dir(home.path())
        .args(["--format", "json", "svc.spec", "svc", "res"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["value"], "restart");
    assert_eq!(json[0]["help"], "lifecycle action");
    assert_eq!(json.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_list_commands() {
    let home = create_temp_dir();
    let spec = create_spec(
        home.path(),
        "multi.spec",
        "@command b :b\n@command a :a\n@label :a\n  x\n@label :b\n  y\n",
    );

    let output = test_command(home.path())
        .arg("--list-commands")
        .arg(&spec)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "a\nb\n");
}

#[test]
fn test_spec_error_exit_code_and_diagnostic() {
    let home = create_temp_dir();
    let spec = create_spec(home.path(), "bad.spec", "@switch\n  @bogus\n");

    let output = test_command(home.path())
        .arg("--check")
        .arg(&spec)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: invalid spec: unexpected command \"@bogus\""), "{stderr}");
    assert!(stderr.contains(&format!("--> {}:2:3", spec.display())), "{stderr}");
    assert!(stderr.contains("2 |   @bogus"), "{stderr}");
}

#[test]
fn test_missing_spec_file() {
    let home = create_temp_dir();
    let output = test_command(home.path())
        .current_dir(home.path())
        .args(["--check", "nope.spec"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: unable to read nope.spec"), "{stderr}");
}

#[test]
fn test_debug_log_file() {
    let home = create_temp_dir();
    let spec = create_spec(home.path(), "svc.spec", SERVICE_SPEC);
    let log = home.path().join("compspec.log");

    let output = test_command(home.path())
        .arg("--debug")
        .arg("--log-file")
        .arg(&log)
        .arg(&spec)
        .args(["svc", ""])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(output.stderr.is_empty(), "{}", String::from_utf8_lossy(&output.stderr));
    let logged = fs::read_to_string(&log).unwrap();
    assert!(logged.contains("completion start"), "{logged}");
}

#[test]
fn test_environment_controls_matching() {
    let home = create_temp_dir();
    let spec = create_spec(home.path(), "case.spec", "Start\n");

    let output = test_command(home.path())
        .env("COMPSPEC_IGNORE_CASE", "0")
        .arg(&spec)
        .args(["svc", "st"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}
