//! End-to-end tests against the `courseflow` binary, driving `run`,
//! `validate`, `inspect`, `completions`, and `doctor` over a small
//! single-day, two-event fixture course.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const SEGMENTS_CSV: &str = "seg_id,seg_label,width_m,segment_type,full_from_km,full_to_km,half_from_km,half_to_km\n\
A1,Start Corral,6.0,start_corral,0.0,0.5,0.0,0.5\n\
A2,Main Straight,4.0,on_course_open,0.5,5.0,0.5,5.0\n";

const FLOW_CSV: &str = "seg_id,event_a,event_b,from_km_a,to_km_a,from_km_b,to_km_b,flow_type,notes\n\
A2,full,half,0.5,5.0,0.5,5.0,overtake,\n";

const FULL_RUNNERS_CSV: &str = "runner_id,event,pace,distance,start_offset,day\n\
f1,full,5.0,5.0,0,sun\n\
f2,full,4.5,5.0,30,sun\n";

const HALF_RUNNERS_CSV: &str = "runner_id,event,pace,distance,start_offset,day\n\
h1,half,6.0,5.0,0,sun\n\
h2,half,5.5,5.0,10,sun\n";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn write_fixture_course(dir: &Path) {
    write(dir, "segments.csv", SEGMENTS_CSV);
    write(dir, "flow.csv", FLOW_CSV);
    write(dir, "full_runners.csv", FULL_RUNNERS_CSV);
    write(dir, "half_runners.csv", HALF_RUNNERS_CSV);
}

fn request_json() -> String {
    r#"{
        "segments_file": "segments.csv",
        "flow_file": "flow.csv",
        "events": [
            {"name": "full", "day": "sun", "start_time_min": 420, "duration_min": 180, "runners_file": "full_runners.csv"},
            {"name": "half", "day": "sun", "start_time_min": 440, "duration_min": 150, "runners_file": "half_runners.csv"}
        ]
    }"#
    .to_string()
}

#[test]
fn validate_reports_ok_on_a_well_formed_request() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_course(dir.path());
    let request_path = dir.path().join("request.json");
    write(dir.path(), "request.json", &request_json());

    Command::cargo_bin("courseflow")
        .unwrap()
        .args(["validate", request_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no issues"))
        .stdout(predicate::str::contains("segments      : 2"))
        .stdout(predicate::str::contains("runners total : 4"));
}

#[test]
fn validate_fails_fast_on_missing_segments_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "flow.csv", FLOW_CSV);
    write(dir.path(), "full_runners.csv", FULL_RUNNERS_CSV);
    write(dir.path(), "half_runners.csv", HALF_RUNNERS_CSV);
    let request_path = dir.path().join("request.json");
    write(dir.path(), "request.json", &request_json());

    Command::cargo_bin("courseflow")
        .unwrap()
        .args(["validate", request_path.to_str().unwrap()])
        .assert()
        .failure()
        .code(predicate::in_iter([2, 3]));
}

#[test]
fn validate_rejects_request_with_path_traversal_in_runners_file() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_course(dir.path());
    let request_path = dir.path().join("request.json");
    let malicious = r#"{
        "segments_file": "segments.csv",
        "flow_file": "flow.csv",
        "events": [
            {"name": "full", "day": "sun", "start_time_min": 420, "duration_min": 180, "runners_file": "../../../../etc/passwd"}
        ]
    }"#;
    write(dir.path(), "request.json", malicious);

    Command::cargo_bin("courseflow")
        .unwrap()
        .args(["validate", request_path.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn inspect_prints_course_and_event_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_course(dir.path());
    let request_path = dir.path().join("request.json");
    write(dir.path(), "request.json", &request_json());

    Command::cargo_bin("courseflow")
        .unwrap()
        .args(["inspect", request_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Course"))
        .stdout(predicate::str::contains("A1"))
        .stdout(predicate::str::contains("A2"))
        .stdout(predicate::str::contains("full"))
        .stdout(predicate::str::contains("half"))
        .stdout(predicate::str::contains("Total: 4 runners across 2 events, 1 days"));
}

#[test]
fn run_executes_the_full_pipeline_and_writes_a_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_course(dir.path());
    let request_path = dir.path().join("request.json");
    write(dir.path(), "request.json", &request_json());
    let out_dir = dir.path().join("out");

    Command::cargo_bin("courseflow")
        .unwrap()
        .args([
            "run",
            request_path.to_str().unwrap(),
            "--out",
            out_dir.to_str().unwrap(),
            "--threads",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("day 'sun': PASS"))
        .stdout(predicate::str::contains("1 day(s) succeeded, 0 failed"));

    let manifest_path = out_dir.join("manifest.json");
    assert!(manifest_path.exists(), "expected manifest at {:?}", manifest_path);
    let manifest_text = fs::read_to_string(&manifest_path).unwrap();
    assert!(manifest_text.contains("sun"));

    let day_dir = out_dir.join("sun");
    assert!(day_dir.join("metadata.json").exists());
    assert!(day_dir.join("bins/bins.parquet").exists());
    assert!(day_dir.join("bins/segment_windows_from_bins.parquet").exists());
}

#[test]
fn run_fails_when_request_references_a_nonexistent_runners_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "segments.csv", SEGMENTS_CSV);
    write(dir.path(), "flow.csv", FLOW_CSV);
    let request_path = dir.path().join("request.json");
    // single-event request referencing a runners file that is never written
    let json = r#"{
        "segments_file": "segments.csv",
        "flow_file": "flow.csv",
        "events": [
            {"name": "full", "day": "sun", "start_time_min": 420, "duration_min": 180, "runners_file": "full_runners.csv"}
        ]
    }"#;
    write(dir.path(), "request.json", json);
    let out_dir = dir.path().join("out");

    Command::cargo_bin("courseflow")
        .unwrap()
        .args(["run", request_path.to_str().unwrap(), "--out", out_dir.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn completions_writes_a_nonempty_bash_script() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("courseflow.bash");

    Command::cargo_bin("courseflow")
        .unwrap()
        .args(["completions", "bash", "--out", out_path.to_str().unwrap()])
        .assert()
        .success();

    let contents = fs::read_to_string(&out_path).unwrap();
    assert!(contents.contains("courseflow"));
}

#[test]
fn doctor_reports_a_writable_environment() {
    Command::cargo_bin("courseflow")
        .unwrap()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("is writable"));
}
