//! `xw state` specs
//!
//! Verify state files are validated, aggregated and rendered.

use crate::prelude::*;

const RUNNING_STATE: &str = r#"{
  "executionId": 42,
  "allNodes": ["db1", "web1", "web2"],
  "executionState": "RUNNING",
  "startTime": "2026-03-01T10:00:00Z",
  "targetNodes": ["web1", "web2"],
  "steps": [
    {
      "stepctx": "1",
      "nodeStep": true,
      "executionState": "NODE_PARTIAL_SUCCEEDED",
      "nodeStates": {
        "web1": { "executionState": "SUCCEEDED", "endTime": "2026-03-01T10:00:04Z" },
        "web2": { "stepctx": "1", "executionState": "FAILED", "endTime": "2026-03-01T10:00:05Z" }
      }
    },
    {
      "stepctx": "2",
      "executionState": "RUNNING",
      "workflow": {
        "steps": [{ "stepctx": "2/1", "executionState": "RUNNING" }]
      }
    }
  ]
}"#;

const FINISHED_STATE: &str = r#"{
  "executionId": 43,
  "executionState": "NODE_MIXED",
  "endTime": "2026-03-01T10:01:00Z",
  "targetNodes": ["web1", "web2"],
  "steps": [
    {
      "stepctx": "1",
      "nodeStep": true,
      "nodeStates": {
        "web1": { "executionState": "SUCCEEDED" },
        "web2": { "executionState": "FAILED" }
      }
    },
    { "stepctx": "2", "executionState": "SUCCEEDED" }
  ]
}"#;

const SUCCEEDED_STATE: &str = r#"{
  "executionId": 44,
  "targetNodes": ["web1"],
  "steps": [{ "stepctx": "1", "executionState": "SUCCEEDED" }]
}"#;

#[test]
fn renders_step_tree() {
    let temp = Project::empty();
    temp.file("state.json", RUNNING_STATE);
    temp.xw().args(&["state", "state.json"]).passes().stdout_eq(
        "Execution 42  running  (1/2 steps)
  1  partially succeeded
      web1  succeeded
      web2  failed
  2  running
    2/1  running
Nodes: db1 idle, web1 succeeded, web2 failed
",
    );
}

#[test]
fn json_output_is_the_typed_tree() {
    let temp = Project::empty();
    temp.file("state.json", RUNNING_STATE);
    let json = temp.xw().args(&["state", "state.json", "-o", "json"]).passes().json();
    assert_eq!(json["execution_id"], "42");
    assert_eq!(json["status"], "RUNNING");
    assert_eq!(json["steps"][0]["status"], "NODE_PARTIAL_SUCCEEDED");
    assert_eq!(json["node_states"]["web2"][0]["status"], "FAILED");
    assert_eq!(json["all_nodes"], serde_json::json!(["db1", "web1", "web2"]));
}

#[test]
fn node_view_lists_its_steps() {
    let temp = Project::empty();
    temp.file("state.json", RUNNING_STATE);
    temp.xw()
        .args(&["state", "state.json", "--node", "web2"])
        .passes()
        .stdout_eq("Node web2  failed\n  1  failed\n");
}

#[test]
fn unknown_node_is_an_error() {
    let temp = Project::empty();
    temp.file("state.json", RUNNING_STATE);
    temp.xw()
        .args(&["state", "state.json", "--node", "cache9"])
        .exits(1)
        .stderr_has("node cache9 is not part of execution 42");
}

#[test]
fn fail_flag_exits_two_on_unsuccessful_end() {
    let temp = Project::empty();
    temp.file("state.json", FINISHED_STATE);
    temp.xw()
        .args(&["state", "state.json", "--fail"])
        .exits(2)
        .stdout_has("Execution 43  mixed")
        .stderr_has("execution mixed");
}

#[test]
fn fail_flag_passes_while_running_or_succeeded() {
    let temp = Project::empty();
    temp.file("running.json", RUNNING_STATE);
    temp.file("ok.json", SUCCEEDED_STATE);
    temp.xw().args(&["state", "running.json", "--fail"]).passes();
    temp.xw().args(&["state", "ok.json", "--fail"]).passes().stdout_has("succeeded");
}

#[test]
fn unknown_status_token_is_rejected() {
    let temp = Project::empty();
    temp.file("state.json", &RUNNING_STATE.replace("\"SUCCEEDED\"", "\"BOGUS\""));
    temp.xw()
        .args(&["state", "state.json"])
        .exits(1)
        .stderr_has("unknown execution status `BOGUS`");
}

#[test]
fn end_time_on_running_step_is_rejected() {
    let temp = Project::empty();
    temp.file(
        "state.json",
        &RUNNING_STATE.replace(
            r#"{ "stepctx": "2/1", "executionState": "RUNNING" }"#,
            r#"{ "stepctx": "2/1", "executionState": "RUNNING", "endTime": "2026-03-01T10:00:09Z" }"#,
        ),
    );
    temp.xw()
        .args(&["state", "state.json"])
        .exits(1)
        .stderr_has("step 2/1 has an end time but status RUNNING is still pending");
}

#[test]
fn misplaced_step_context_is_rejected() {
    let temp = Project::empty();
    temp.file("state.json", &RUNNING_STATE.replace(r#""stepctx": "2/1""#, r#""stepctx": "3/1""#));
    temp.xw()
        .args(&["state", "state.json"])
        .exits(1)
        .stderr_has("step context id 3/1 is not nested under 2");
}

#[test]
fn missing_file_is_reported() {
    let temp = Project::empty();
    temp.xw().args(&["state", "nope.json"]).exits(1).stderr_has("cannot read nope.json");
}
