//! End-to-end test: replay a fixture through the binary and inspect the JSONL output.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const FIXTURE: &str = "tests/fixtures/campaign_and_reflex.jsonl";

/// Scratch directory holding the config, log file and output of one test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flipwatch_e2e_{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    let config = format!(
        "app_name = \"e2e\"\nlog_file_path = \"{}\"\n",
        dir.join("flipwatch.log").display()
    );
    fs::write(dir.join("config.toml"), config).expect("write config");
    dir
}

fn run(dir: &Path, extra: &[&str]) -> Vec<Value> {
    let output_path = dir.join("out.jsonl");
    let status = Command::new(env!("CARGO_BIN_EXE_flipwatch"))
        .arg(FIXTURE)
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--output")
        .arg(&output_path)
        .args(extra)
        .env_remove("FLIPWATCH_APP_NAME")
        .env_remove("FLIPWATCH_TIMEOUT_MARKER")
        .status()
        .expect("Failed to execute binary");
    assert!(status.success(), "binary exited with {status}");

    fs::read_to_string(output_path)
        .expect("output written")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect()
}

fn calls_named<'a>(records: &'a [Value], call: &str) -> Vec<&'a Value> {
    records.iter().filter(|r| r["call"] == call).collect()
}

#[test]
fn fixture_replay_emits_one_report_per_level_run() {
    let dir = scratch("reports");

    let records = run(&dir, &[]);

    assert_eq!(records[0]["call"], "initialize");
    assert_eq!(records[0]["app_name"], "e2e");
    assert_eq!(calls_named(&records, "start_level").len(), 3);
    assert_eq!(calls_named(&records, "record_task").len(), 4);
    assert_eq!(calls_named(&records, "submit_report").len(), 3);

    let ends = calls_named(&records, "end_level");
    assert_eq!(ends[0]["level_id"], "level_1");
    assert_eq!(ends[0]["success"], true);
    assert_eq!(ends[0]["duration_ms"], 4_500);
    assert_eq!(ends[0]["xp"], 85);
    assert_eq!(ends[1]["level_id"], "level_2");
    assert_eq!(ends[1]["success"], false);
    assert_eq!(ends[1]["duration_ms"], 5_000);
    assert_eq!(ends[2]["level_id"], "reflex");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn timeout_marker_flag_changes_detection() {
    let dir = scratch("marker");

    let records = run(&dir, &["--timeout-marker", "Buzzer"]);

    let ends = calls_named(&records, "end_level");
    assert_eq!(ends.len(), 2);
    assert!(ends.iter().all(|end| end["success"] == true));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_script_line_fails_with_line_number() {
    let dir = scratch("invalid");
    let script = dir.join("bad.jsonl");
    fs::write(&script, "{\"op\":\"begin_reflex\"}\n{\"op\":\"jump\"}\n").expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_flipwatch"))
        .arg(&script)
        .arg("--config")
        .arg(dir.join("config.toml"))
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line: 2"), "stderr was: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn out_of_range_advance_exits_with_error() {
    let dir = scratch("overflow");
    let script = dir.join("overflow.jsonl");
    fs::write(
        &script,
        "{\"op\":\"begin_level\",\"level\":1}\n{\"op\":\"advance\",\"ms\":18446744073709551615}\n{\"op\":\"complete_level\"}\n",
    )
    .expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_flipwatch"))
        .arg(&script)
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--output")
        .arg(dir.join("out.jsonl"))
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ClockOverflow"), "stderr was: {stderr}");
    assert!(!stderr.contains("panicked"), "stderr was: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}
