//! `xw tail` specs
//!
//! Verify output tailing through the cursor: filters, offsets and follow.

use crate::prelude::*;

const LOG: &str = r#"{"time":"10:00:01","level":"NORMAL","log":"starting","node":"web1","stepctx":"1"}
{"time":"10:00:02","level":"WARNING","log":"slow disk","node":"web2","stepctx":"1"}
{"time":"10:00:03","level":"ERROR","log":"restart failed","node":"web2","stepctx":"2/1"}
{"time":"10:00:04","level":"DEBUG","log":"retrying","node":"web1","stepctx":"2e"}
"#;

const DONE_STATE: &str = r#"{
  "executionId": 9,
  "targetNodes": ["web1", "web2"],
  "steps": [
    { "stepctx": "1", "nodeStep": true, "nodeStates": {
        "web1": { "executionState": "SUCCEEDED" },
        "web2": { "executionState": "SUCCEEDED" } } },
    { "stepctx": "2", "executionState": "FAILED" }
  ]
}"#;

const RUNNING_STATE: &str = r#"{
  "executionId": 9,
  "steps": [{ "stepctx": "1", "executionState": "RUNNING" }]
}"#;

fn project() -> Project {
    let temp = Project::empty();
    temp.file("out.jsonl", LOG);
    temp
}

#[test]
fn prints_every_entry_and_a_resume_hint() {
    project()
        .xw()
        .args(&["tail", "out.jsonl"])
        .passes()
        .stdout_eq(
            "10:00:01 NORMAL  web1 1  starting
10:00:02 WARNING web2 1  slow disk
10:00:03 ERROR   web2 2/1  restart failed
10:00:04 DEBUG   web1 2e  retrying
",
        )
        .stderr_has(&format!("resume with --offset {}", LOG.len()));
}

#[test]
fn node_filter() {
    project()
        .xw()
        .args(&["tail", "out.jsonl", "--node", "web2"])
        .passes()
        .stdout_has("slow disk")
        .stdout_has("restart failed")
        .stdout_lacks("starting");
}

#[test]
fn step_filter_includes_nested_steps() {
    project()
        .xw()
        .args(&["tail", "out.jsonl", "--step", "2"])
        .passes()
        .stdout_has("restart failed")
        .stdout_has("retrying")
        .stdout_lacks("slow disk");
}

#[test]
fn level_threshold() {
    project()
        .xw()
        .args(&["tail", "out.jsonl", "--level", "warning"])
        .passes()
        .stdout_has("slow disk")
        .stdout_has("restart failed")
        .stdout_lacks("starting")
        .stdout_lacks("retrying");
}

#[test]
fn offset_resumes_after_delivered_lines() {
    let first_line = LOG.lines().next().unwrap().len() + 1;
    project()
        .xw()
        .args(&["tail", "out.jsonl", "--offset", &first_line.to_string()])
        .passes()
        .stdout_lacks("starting")
        .stdout_has("slow disk");
}

#[test]
fn offset_past_everything_prints_nothing() {
    project()
        .xw()
        .args(&["tail", "out.jsonl", "--offset", &LOG.len().to_string()])
        .passes()
        .stdout_eq("");
}

#[test]
fn partial_last_line_is_held_back() {
    let temp = project();
    temp.file("out.jsonl", &format!("{}{}", LOG, r#"{"time":"10:00:05","level":"NOR"#));
    temp.xw()
        .args(&["tail", "out.jsonl"])
        .passes()
        .stdout_has("retrying")
        .stderr_has(&format!("resume with --offset {}", LOG.len()));
}

#[test]
fn follow_ends_when_execution_and_log_finish() {
    let temp = project();
    temp.file("state.json", DONE_STATE);
    temp.xw()
        .env("XW_LOG_POLL_MS", "10")
        .args(&["tail", "out.jsonl", "--state", "state.json", "--follow"])
        .passes()
        .stdout_has("starting")
        .stdout_has("retrying");
}

#[test]
fn follow_prints_unterminated_last_line_of_finished_execution() {
    let temp = project();
    temp.file("state.json", DONE_STATE);
    temp.file(
        "out.jsonl",
        &format!("{}{}", LOG, r#"{"time":"10:00:05","level":"NORMAL","log":"done","node":"web1","stepctx":"2"}"#),
    );
    temp.xw()
        .env("XW_LOG_POLL_MS", "10")
        .args(&["tail", "out.jsonl", "--state", "state.json", "--follow"])
        .passes()
        .stdout_has("retrying")
        .stdout_has("web1 2  done");
}

#[test]
fn fail_flag_reports_unsuccessful_execution() {
    let temp = project();
    temp.file("state.json", DONE_STATE);
    temp.xw()
        .env("XW_LOG_POLL_MS", "10")
        .args(&["tail", "out.jsonl", "--state", "state.json", "-f", "--fail"])
        .exits(2)
        .stderr_has("execution mixed");
}

#[test]
fn finished_log_has_no_resume_hint() {
    let temp = project();
    temp.file("state.json", DONE_STATE);
    let run = temp.xw().args(&["tail", "out.jsonl", "--state", "state.json"]).passes();
    assert!(!run.stderr().contains("resume with"), "{}", run.stderr());
}

#[test]
fn json_snapshot_carries_offset_and_completion() {
    let temp = project();
    temp.file("state.json", RUNNING_STATE);
    let json = temp
        .xw()
        .args(&["tail", "out.jsonl", "--state", "state.json", "--node", "web1", "-o", "json"])
        .passes()
        .json();
    assert_eq!(json["execution_id"], "9");
    assert_eq!(json["offset"], LOG.len());
    assert_eq!(json["status"], "RUNNING");
    assert_eq!(json["completion"]["log_finished"], false);
    assert_eq!(json["entries"].as_array().unwrap().len(), 2);
    assert_eq!(json["filter"]["node"], "web1");
}

#[test]
fn malformed_entry_fails() {
    let temp = Project::empty();
    temp.file("out.jsonl", "{\"level\":\"LOUD\",\"log\":\"x\"}\n");
    temp.xw()
        .args(&["tail", "out.jsonl"])
        .exits(1)
        .stderr_has("unknown log level `LOUD`");
}
