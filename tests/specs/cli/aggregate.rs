//! `xw aggregate` specs
//!
//! Verify status roll-up from the command line.

use crate::prelude::*;

#[test]
fn node_scope_split_outcome_is_partial() {
    cli()
        .args(&["aggregate", "--scope", "node", "SUCCEEDED", "FAILED"])
        .passes()
        .stdout_eq("NODE_PARTIAL_SUCCEEDED\n");
}

#[test]
fn step_scope_split_outcome_is_mixed() {
    cli()
        .args(&["aggregate", "--scope", "step", "SUCCEEDED", "ABORTED"])
        .passes()
        .stdout_eq("NODE_MIXED\n");
}

#[test]
fn any_pending_child_keeps_parent_running() {
    cli()
        .args(&["aggregate", "succeeded", "running", "NOT_STARTED"])
        .passes()
        .stdout_eq("RUNNING\n");
}

#[test]
fn no_children_is_not_started() {
    cli().args(&["aggregate"]).passes().stdout_eq("NOT_STARTED\n");
}

#[test]
fn json_output_includes_scope() {
    let json = cli()
        .args(&["aggregate", "--scope", "node", "-o", "json", "FAILED", "FAILED"])
        .passes()
        .json();
    assert_eq!(json["status"], "FAILED");
    assert_eq!(json["scope"], "node_fanout");
    assert_eq!(json["children"], 2);
}

#[test]
fn unknown_status_fails() {
    cli()
        .args(&["aggregate", "SUCCEEDED", "BOGUS"])
        .exits(1)
        .stderr_has("unknown execution status `BOGUS`");
}
