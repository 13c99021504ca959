use std::path::Path;
use std::process::{Command, Output};

use riskpulse_core::{Band, PolicyConfig, RiskConfig};
use riskpulse_history::store::HistoryStore;

fn riskpulse(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_riskpulse"))
        .args(args)
        .current_dir(dir)
        .env("CI", "true")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .output()
        .unwrap()
}

#[test]
fn demo_writes_report_and_alerts_on_second_run() {
    let dir = tempfile::tempdir().unwrap();

    let first = riskpulse(dir.path(), &["demo", "--no-browser"]);
    assert!(first.status.success(), "demo failed: {}", String::from_utf8_lossy(&first.stderr));

    let report = dir.path().join("risk_report.html");
    let html = std::fs::read_to_string(&report).unwrap();
    assert!(html.contains("Risk Report – demo/sample"));
    assert!(html.contains("Files analyzed: 5"));
    assert!(html.contains("Alerts triggered: 0"));

    let second = riskpulse(dir.path(), &["demo", "--no-browser"]);
    assert!(second.status.success());
    let html = std::fs::read_to_string(&report).unwrap();
    assert!(html.contains("Alerts triggered: 1"));
    assert!(html.contains("<strong>utils/helpers.py</strong> – critical two runs in a row"));

    let store = HistoryStore::open(&dir.path().join(".github/risk_scoring.db")).unwrap();
    assert_eq!(store.count().unwrap(), 10);
    assert_eq!(store.streak("utils/helpers.py", Band::Critical).unwrap(), 2);
}

#[test]
fn demo_respects_output_and_db_flags() {
    let dir = tempfile::tempdir().unwrap();
    let output = riskpulse(
        dir.path(),
        &["demo", "--no-browser", "--output", "out/report.html", "--db", "state/hist.db"],
    );
    assert!(output.status.success());
    assert!(dir.path().join("out/report.html").exists());
    assert!(dir.path().join("state/hist.db").exists());
    assert!(!dir.path().join("risk_report.html").exists());
}

#[test]
fn history_lists_recorded_runs() {
    let dir = tempfile::tempdir().unwrap();
    assert!(riskpulse(dir.path(), &["demo", "--no-browser"]).status.success());

    let output = riskpulse(dir.path(), &["history", "src/auth/login.py"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("high"));
}

#[test]
fn history_without_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = riskpulse(dir.path(), &["history", "src/lib.rs"]);
    assert!(!output.status.success());
}

#[test]
fn scan_rejects_malformed_repo_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let output = riskpulse(dir.path(), &["scan", "not-a-repo", "--no-browser"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not-a-repo"));
    assert!(!dir.path().join(".github").exists());
}

#[test]
fn scan_requires_repo_in_ci() {
    let dir = tempfile::tempdir().unwrap();
    let output = riskpulse(dir.path(), &["scan", "--no-browser"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Missing repository argument"));
}

#[test]
fn unreachable_api_exits_cleanly_without_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".riskpulse.toml"),
        "[fetch]\napi_base = \"http://127.0.0.1:9\"\n",
    )
    .unwrap();

    let output = riskpulse(dir.path(), &["scan", "octocat/hello", "--no-browser"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No report written"));
    assert!(!dir.path().join("risk_report.html").exists());
}

#[test]
fn init_writes_config_matching_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = riskpulse(dir.path(), &["init"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let content = std::fs::read_to_string(dir.path().join(".riskpulse.toml")).unwrap();
    let config = RiskConfig::from_toml(&content).unwrap();
    let defaults = PolicyConfig::default();
    assert_eq!(config.policy.exclude, defaults.exclude);
    assert_eq!(config.policy.core_paths, defaults.core_paths);
    assert_eq!(config.fetch.window_days, 30);
    assert_eq!(config.output.history_db, Path::new(".github/risk_scoring.db"));
}

#[test]
fn init_leaves_existing_config_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".riskpulse.toml");
    std::fs::write(&path, "[fetch]\nwindow_days = 7\n").unwrap();

    let output = riskpulse(dir.path(), &["init"]);
    assert!(!output.status.success());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[fetch]\nwindow_days = 7\n");
}

#[test]
fn zero_day_window_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = riskpulse(dir.path(), &["scan", "octocat/hello", "--days", "0", "--no-browser"]);
    assert!(!output.status.success());
    assert!(!dir.path().join(".github").exists());
}
