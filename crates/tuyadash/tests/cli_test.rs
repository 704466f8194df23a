//! Integration tests for the `tuyadash` CLI binary.
//!
//! Argument parsing, help output, and completions run without a backend;
//! device commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `tuyadash` binary with env isolation.
///
/// Clears all `TUYADASH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn tuyadash_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tuyadash");
    cmd.env("HOME", "/tmp/tuyadash-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/tuyadash-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("TUYADASH_PROFILE")
        .env_remove("TUYADASH_URL")
        .env_remove("TUYADASH_OUTPUT")
        .env_remove("TUYADASH_INSECURE")
        .env_remove("TUYADASH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// A `ci` profile pointing at `server` with fast refresh schedules.
fn with_fast_profile(cmd: &mut assert_cmd::Command, server: &MockServer) {
    cmd.env("TUYADASH_PROFILES__CI__URL", server.uri())
        .env("TUYADASH_PROFILES__CI__POLLING__REFRESH_ATTEMPTS", "2")
        .env("TUYADASH_PROFILES__CI__POLLING__REFRESH_DELAY_MS", "10")
        .env("TUYADASH_PROFILES__CI__POLLING__ACCEPTED_ATTEMPTS", "2")
        .env("TUYADASH_PROFILES__CI__POLLING__ACCEPTED_DELAY_MS", "10")
        .env("TUYADASH_PROFILES__CI__POLLING__REJECTED_ATTEMPTS", "1")
        .env("TUYADASH_PROFILES__CI__POLLING__REJECTED_DELAY_MS", "10")
        .args(["--profile", "ci"]);
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn lamp(on: bool) -> Value {
    json!({
        "id": "a1",
        "name": "Lamp",
        "productName": "Smart Plug",
        "online": true,
        "status": [
            { "code": "switch_1", "value": on },
            { "code": "cur_power", "value": 120 }
        ]
    })
}

async fn mount_list(server: &MockServer, devices: Value) {
    Mock::given(method("GET"))
        .and(path("/api/tuya/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "devices": devices })))
        .mount(server)
        .await;
}

async fn mount_device(server: &MockServer, device: Value) {
    Mock::given(method("GET"))
        .and(path("/api/tuya/devices/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = tuyadash_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    tuyadash_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("smart-home devices")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    tuyadash_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tuyadash"));
}

#[test]
fn test_devices_help_lists_subcommands() {
    tuyadash_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("toggle")
                .and(predicate::str::contains("watch"))
                .and(predicate::str::contains("set")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    tuyadash_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    tuyadash_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_devices_without_backend_is_usage_error() {
    let output = tuyadash_cmd().args(["devices", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No backend configured"), "{text}");
}

#[test]
fn test_non_http_url_is_rejected() {
    let output = tuyadash_cmd()
        .args(["--url", "ftp://nas.local", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("expected http or https"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = tuyadash_cmd()
        .args(["--profile", "ghost", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Profile 'ghost' not found"));
}

#[test]
fn test_config_path_points_at_toml() {
    tuyadash_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Device list ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_is_sorted_by_name() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": "b2", "name": "Bravo" },
            { "id": "a9", "name": "Alpha" },
            { "id": "a1", "name": "Alpha" }
        ]),
    )
    .await;

    tuyadash_cmd()
        .args(["--url", &server.uri(), "-o", "plain", "devices", "list"])
        .assert()
        .success()
        .stdout("a1\na9\nb2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_table_shows_cards() {
    let server = MockServer::start().await;
    mount_list(&server, json!([lamp(true)])).await;

    tuyadash_cmd()
        .args(["--url", &server.uri(), "devices", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Lamp")
                .and(predicate::str::contains("Smart Plug"))
                .and(predicate::str::contains("switch_1 on"))
                .and(predicate::str::contains("Power 120 W")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_list_prints_message() {
    let server = MockServer::start().await;
    mount_list(&server, json!([])).await;

    tuyadash_cmd()
        .args(["--url", &server.uri(), "devices", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No devices found."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_list_as_json_is_an_empty_array() {
    let server = MockServer::start().await;
    mount_list(&server, json!([])).await;

    let output = tuyadash_cmd()
        .args(["--url", &server.uri(), "-o", "json", "devices", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_failure_surfaces_cause() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tuya/devices"))
        .respond_with(ResponseTemplate::new(500).set_body_string("tuya cloud unavailable"))
        .mount(&server)
        .await;

    let output = tuyadash_cmd()
        .args(["--url", &server.uri(), "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Failed to load devices"), "{text}");
    assert!(text.contains("tuya cloud unavailable"), "{text}");
}

// ── Single device ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_get_unknown_device_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tuya/devices/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = tuyadash_cmd()
        .args(["--url", &server.uri(), "devices", "get", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("device 'nope' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_prints_detail() {
    let server = MockServer::start().await;
    mount_device(&server, lamp(false)).await;

    tuyadash_cmd()
        .args(["--url", &server.uri(), "devices", "get", "a1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Name:     Lamp")
                .and(predicate::str::contains("switch_1: off  (Turn on)")),
        );
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_toggle_sends_inverse_and_reconciles() {
    let server = MockServer::start().await;
    mount_device(&server, lamp(true)).await;
    Mock::given(method("POST"))
        .and(path("/api/tuya/devices/a1/command"))
        .and(body_json(json!({ "commands": [{ "code": "switch_1", "value": false }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = tuyadash_cmd();
    with_fast_profile(&mut cmd, &server);
    cmd.args(["devices", "toggle", "a1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("write accepted, 2/2 reads"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_write_exits_with_conflict_code() {
    let server = MockServer::start().await;
    mount_device(&server, lamp(true)).await;
    Mock::given(method("POST"))
        .and(path("/api/tuya/devices/a1/command"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cmd = tuyadash_cmd();
    with_fast_profile(&mut cmd, &server);
    let output = cmd.args(["devices", "toggle", "a1"]).output().unwrap();

    assert_eq!(output.status.code(), Some(6));
    let text = combined_output(&output);
    assert!(text.contains("write not accepted, 1/1 reads"), "{text}");
    assert!(text.contains("Lamp"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_toggle_unknown_switch_sends_nothing() {
    let server = MockServer::start().await;
    mount_device(&server, lamp(true)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = tuyadash_cmd()
        .args(["--url", &server.uri(), "devices", "toggle", "a1", "--code", "switch_9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("has no switch 'switch_9'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_forwards_json_values() {
    let server = MockServer::start().await;
    mount_device(&server, lamp(true)).await;
    Mock::given(method("POST"))
        .and(path("/api/tuya/devices/a1/command"))
        .and(body_json(json!({ "commands": [{ "code": "bright_value", "value": 500 }] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = tuyadash_cmd();
    with_fast_profile(&mut cmd, &server);
    cmd.args(["devices", "set", "a1", "bright_value", "500"])
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_prints_each_snapshot() {
    let server = MockServer::start().await;
    mount_device(&server, lamp(true)).await;

    let output = tuyadash_cmd()
        .args([
            "--url",
            &server.uri(),
            "-o",
            "json",
            "devices",
            "watch",
            "a1",
            "-n",
            "3",
            "--delay-ms",
            "10",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let snapshots: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().all(|s| s["title"] == "Lamp"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("3/3 reads succeeded"));
}

// ── Config file round trip ──────────────────────────────────────────

#[cfg(target_os = "linux")]
#[test]
fn test_config_set_use_and_show() {
    let home = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let mut cmd = tuyadash_cmd();
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path().join(".config"))
            .args(args);
        cmd
    };

    run(&["--profile", "lab", "config", "set", "url", "http://10.0.0.5:8080"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Set url on profile 'lab'"));

    run(&["config", "profiles"]).assert().success().stdout("lab\n");

    run(&["config", "use", "lab"]).assert().success();
    run(&["config", "profiles"]).assert().success().stdout("lab *\n");

    run(&["config", "show"]).assert().success().stdout(
        predicate::str::contains("[profiles.lab]")
            .and(predicate::str::contains("url = \"http://10.0.0.5:8080\"")),
    );

    run(&["config", "use", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope"));
}
