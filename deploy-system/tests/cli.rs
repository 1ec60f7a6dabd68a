// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

use std::fs;

use assert_cmd::Command;

const ENV_VARS: [&str; 10] = [
    "DEPLOY_IN",
    "DEPLOY_OUT",
    "JSON_RPC_ENDPOINT",
    "ARTIFACTS_DIR",
    "REDEPLOY_ALL",
    "KEYSTORE",
    "PASSFILE",
    "PRIVATE_KEYS",
    "LOCAL_CHAIN",
    "MLN_VERBOSE",
];

/// The binary with every ambient configuration variable scrubbed.
fn deploy_system() -> Command {
    let mut cmd = Command::cargo_bin("deploy-system").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn missing_arguments_print_usage_and_exit_one() {
    let assert = deploy_system().assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("Usage"));
}

#[test]
fn extra_arguments_print_usage_and_exit_one() {
    let assert = deploy_system()
        .args(["in.json", "out.json", "extra.json"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("Usage"));
}

#[test]
fn help_prints_usage_and_exits_zero() {
    let assert = deploy_system().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("DEPLOY_IN"));
}

#[test]
fn version_exits_zero() {
    deploy_system().arg("--version").assert().success();
}

#[test]
fn positionals_fall_back_to_the_environment() {
    // parsing must accept the env-supplied paths; the run then dies on the
    // unreachable endpoint, not on a usage error
    let assert = deploy_system()
        .env("DEPLOY_IN", "in.json")
        .env("DEPLOY_OUT", "out.json")
        .args(["--endpoint", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(!stderr.contains("Usage"));
    assert!(stderr.contains("error"));
}

#[test]
fn malformed_force_entries_fail_before_touching_the_network() {
    let assert = deploy_system()
        .args(["in.json", "out.json", "--force", "melonEngine"])
        .args(["--endpoint", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("force entry"));
}

#[test]
fn malformed_key_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let keys = dir.path().join("keys.json");
    fs::write(&keys, "not json").unwrap();

    deploy_system()
        .args(["in.json", "out.json"])
        .args(["--endpoint", "http://127.0.0.1:1"])
        .arg("--private-keys")
        .arg(&keys)
        .assert()
        .failure()
        .code(1);
}
