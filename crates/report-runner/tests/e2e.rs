// End-to-end tests for the rr binary, using the built-in loopback backend.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const POOL: &str = r#"{
    "alpha": { "password": "a" },
    "bravo": { "password": "b", "shared_secret": "s" },
    "charlie": { "password": "c", "operational": true },
    "delta": { "password": "d", "operational": 5 },
    "echo": { "password": "e", "requires_manual_step": true },
    "foxtrot": { "password": "f" }
}
"#;

fn write_fixture(dir: &Path) -> PathBuf {
    let config = dir.join("rr.toml");
    std::fs::write(
        &config,
        r#"
target_id = "from-file"
report_count = 2
warmup_ms = 0
proxies = ["http://127.0.0.1:3128"]

[chunks]
size = 2
beautify_delay_ms = 0
inter_chunk_delay_ms = 0
connect_to_submit_delay_ms = 0

[submission]
flags = { poor_performance = true }
"#,
    )
    .unwrap();
    std::fs::write(dir.join("accounts.json"), POOL).unwrap();
    config
}

fn rr(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rr"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run rr")
}

#[test]
fn cli_help_displays_correctly() {
    let output = Command::new(env!("CARGO_BIN_EXE_rr"))
        .arg("--help")
        .output()
        .expect("failed to run rr --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Report Runner"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("pool"));
}

#[test]
fn run_help_shows_separate_target_and_count() {
    let output = Command::new(env!("CARGO_BIN_EXE_rr"))
        .args(["run", "--help"])
        .output()
        .expect("failed to run rr run --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--target-id"));
    assert!(stdout.contains("--count"));
}

#[test]
fn run_sends_reports_and_persists_pool() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    let output = rr(&config, &["run", "--count", "3", "--loopback-latency-ms", "0"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sent 3/3 reports, 0 reports failed"));

    let text = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();
    assert!(text.starts_with("{\n    \"alpha\""));
    let pool: serde_json::Value = serde_json::from_str(&text).unwrap();
    for name in ["alpha", "bravo", "charlie"] {
        assert!(
            pool[name]["last_attempt_at"].is_string(),
            "{name} should have been attempted"
        );
    }
    for name in ["delta", "echo", "foxtrot"] {
        assert!(pool[name].get("last_attempt_at").is_none());
    }
    assert_eq!(pool["delta"]["operational"], serde_json::json!(5));
    assert_eq!(pool["bravo"]["shared_secret"], serde_json::json!("s"));
}

#[test]
fn run_with_too_few_identities_leaves_pool_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    let output = rr(&config, &["run", "--count", "5", "--loopback-latency-ms", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("4/6 identities available but 5 are needed"));

    let text = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();
    assert_eq!(text, POOL);
}

#[test]
fn run_rejects_non_numeric_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    let output = rr(&config, &["run", "--count", "many"]);
    assert!(!output.status.success());
}

#[test]
fn plan_prints_chunks_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    let output = rr(&config, &["plan", "--target-id", "m-77", "--count", "3"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Target m-77: 3 report(s) in 2 chunk(s)"));
    assert!(stdout.contains("chunk 1/2 [2] via http://127.0.0.1:3128: alpha, bravo"));
    assert!(stdout.contains("chunk 2/2 [1] via http://127.0.0.1:3128: charlie"));

    let text = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();
    assert_eq!(text, POOL);
}

#[test]
fn pool_status_counts_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    let output = rr(&config, &["pool", "status"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("total:         6"));
    assert!(stdout.contains("eligible:      4"));
    assert!(stdout.contains("disabled:      1"));
    assert!(stdout.contains("manual step:   1"));
}
