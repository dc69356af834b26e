//! Command-line behaviour of the `azmesh` binary
//!
//! Every invocation runs in a scratch directory with the configuration
//! variables cleared, so a developer's `.env` or shell cannot leak in.

use assert_cmd::prelude::*;
use az_latency_mesh::{
    models::{Measurement, Node, Pair, ProbeStats, Run},
    persist::{RunStore, REPORT_FILE},
    types::ProbeErrorKind,
};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const CONFIG_VARS: &[&str] = &[
    "SSH_KEY",
    "SSH_USER",
    "PING_COUNT",
    "PARALLEL_JOBS",
    "PROBE_INTERVAL_MS",
    "PROBE_TIMEOUT_SECONDS",
    "CONNECT_TIMEOUT_SECONDS",
    "RUN_TIMEOUT_SECONDS",
    "INVENTORY_FILE",
    "TERRAFORM_DIR",
    "OUTPUT_DIR",
    "ENABLE_COLOR",
];

fn azmesh(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("azmesh").unwrap();
    cmd.current_dir(workdir);
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn node(az_id: &str, last_octet: u8) -> Node {
    Node {
        id: format!("eu-west-1-{}", az_id),
        region: "eu-west-1".to_string(),
        az_id: az_id.to_string(),
        az_name: None,
        instance_id: None,
        public_address: Some(format!("54.0.0.{}", last_octet)),
        private_address: format!("10.0.{}.10", last_octet),
        cloud: Some("aws".to_string()),
    }
}

/// Saved run with one result and one timeout
fn write_saved_run(dir: &Path) {
    let mut run = Run::new(100, vec!["eu-west-1".to_string()], vec!["aws".to_string()]);
    let fast = Pair::new("eu-west-1", node("euw1-az1", 1), node("euw1-az2", 2));
    let slow = Pair::new("eu-west-1", node("euw1-az1", 1), node("euw1-az3", 3));
    let stats = ProbeStats {
        min_ms: 0.52,
        avg_ms: 0.61,
        max_ms: 0.94,
        mdev_ms: 0.04,
        packet_loss_pct: 0.0,
    };
    run.record(Measurement::result(&fast, stats, 100));
    run.record(Measurement::error(&slow, ProbeErrorKind::Timeout, Some("no answer".to_string())));
    run.finalize();
    RunStore::create(dir).unwrap().save_run(&run).unwrap();
}

#[test]
fn test_help_lists_core_options() {
    let temp = TempDir::new().unwrap();
    azmesh(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--ssh-key"))
        .stdout(predicate::str::contains("--report-from"))
        .stdout(predicate::str::contains("--max-workers"));
}

#[test]
fn test_help_topic() {
    let temp = TempDir::new().unwrap();
    azmesh(temp.path())
        .args(["--help-topic", "timeout", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROBE TIMEOUTS"));
}

#[test]
fn test_report_from_saved_run() {
    let temp = TempDir::new().unwrap();
    let run_dir = temp.path().join("run");
    write_saved_run(&run_dir);

    azmesh(temp.path())
        .arg("--report-from")
        .arg(&run_dir)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total measurements"))
        .stdout(predicate::str::contains("0.610"))
        .stderr(predicate::str::contains("Terraform directory").not())
        .stderr(predicate::str::contains("[WARNING]").not());

    let report = fs::read_to_string(run_dir.join(REPORT_FILE)).unwrap();
    assert!(report.contains("Inter-AZ Latency Report"));
    assert!(report.contains("euw1-az1"));
    assert!(report.contains("timeout"));
}

#[test]
fn test_short_probe_timeout_alone_is_accepted() {
    let temp = TempDir::new().unwrap();
    let run_dir = temp.path().join("run");
    write_saved_run(&run_dir);

    azmesh(temp.path())
        .arg("--report-from")
        .arg(&run_dir)
        .args(["--probe-timeout", "5", "--no-color"])
        .assert()
        .success();
}

#[test]
fn test_report_from_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    azmesh(temp.path())
        .args(["--report-from", "nowhere/results.json", "--no-color"])
        .assert()
        .code(5);
}

#[test]
fn test_malformed_inventory_exit_code() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bad.json"), "{ \"node\": ").unwrap();
    fs::write(temp.path().join("key.pem"), "not a real key").unwrap();

    azmesh(temp.path())
        .args(["--inventory", "bad.json", "--ssh-key", "key.pem", "--no-color"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Inventory help"));
}

#[test]
fn test_empty_inventory_exit_code() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("empty.json"), "{}").unwrap();

    azmesh(temp.path())
        .args(["--inventory", "empty.json", "--ssh-key", "key.pem", "--no-color"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_ssh_key_is_config_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("inventory.json"), "{}").unwrap();

    azmesh(temp.path())
        .args(["--inventory", "inventory.json", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SSH private key"));
}

#[test]
fn test_conflicting_flags_are_rejected() {
    let temp = TempDir::new().unwrap();
    azmesh(temp.path())
        .args(["--report-from", "results.json", "--inventory", "inventory.json", "--no-color"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_env_value_is_config_error() {
    let temp = TempDir::new().unwrap();
    azmesh(temp.path())
        .env("PARALLEL_JOBS", "many")
        .args(["--report-from", "results.json", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PARALLEL_JOBS"));
}

#[test]
fn test_dotenv_file_is_read() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".env"), "PING_COUNT=0\n").unwrap();

    azmesh(temp.path())
        .args(["--report-from", "results.json", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Ping count"));
}
