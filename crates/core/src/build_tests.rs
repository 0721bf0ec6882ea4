// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::raw::RawTiming;
use crate::test_support::{raw_execution, raw_leaf, raw_node_step, raw_sub_workflow};

fn ctx(s: &str) -> StepContextId {
    s.parse().unwrap()
}

fn ended() -> RawTiming {
    RawTiming { end_time: Some("2026-03-01T10:00:00Z".parse().unwrap()), ..Default::default() }
}

#[test]
fn leaf_steps_roll_up_into_workflow() {
    let raw = raw_execution(
        1,
        &["web1"],
        vec![raw_leaf("1", "SUCCEEDED"), raw_leaf("2", "RUNNING")],
    );
    let state = build_execution(raw).unwrap();
    assert_eq!(state.execution_id, "1");
    assert_eq!(state.status(), ExecutionStatus::Running);
    assert_eq!(state.workflow.step_count, 2);
    assert_eq!(state.step(&ctx("2")).unwrap().status(), ExecutionStatus::Running);
}

#[test]
fn node_step_with_split_outcome_is_partial() {
    let raw = raw_execution(
        2,
        &["web1", "web2"],
        vec![raw_node_step("1", &[("web1", "SUCCEEDED"), ("web2", "FAILED")])],
    );
    let state = build_execution(raw).unwrap();
    let step = state.step(&ctx("1")).unwrap();
    assert!(step.is_node_step());
    assert_eq!(step.status(), ExecutionStatus::NodePartialSucceeded);
    assert_eq!(state.status(), ExecutionStatus::NodeMixed);
}

#[test]
fn sub_workflows_are_built_recursively() {
    let raw = raw_execution(
        3,
        &["web1", "web2"],
        vec![
            raw_sub_workflow(
                "1",
                vec![
                    raw_leaf("1/1", "SUCCEEDED"),
                    raw_node_step("1/2", &[("web1", "FAILED"), ("web2", "FAILED")]),
                ],
            ),
            raw_node_step("2", &[("web1", "NOT_STARTED"), ("web2", "NOT_STARTED")]),
        ],
    );
    let state = build_execution(raw).unwrap();

    let outer = state.step(&ctx("1")).unwrap();
    let inner = outer.sub_workflow().unwrap();
    assert_eq!(inner.steps.len(), 2);
    assert_eq!(inner.status, ExecutionStatus::NodeMixed);
    assert_eq!(outer.status(), ExecutionStatus::NodeMixed);
    assert_eq!(state.step(&ctx("1/2")).unwrap().status(), ExecutionStatus::Failed);
    assert_eq!(state.status(), ExecutionStatus::Running);
}

#[test]
fn node_states_collect_every_level_in_context_order() {
    let raw = raw_execution(
        4,
        &["web1", "web2"],
        vec![
            raw_sub_workflow("1", vec![raw_node_step("1/1", &[("web1", "SUCCEEDED")])]),
            raw_node_step("2", &[("web1", "RUNNING"), ("web2", "WAITING")]),
        ],
    );
    let state = build_execution(raw).unwrap();
    let contexts: Vec<String> =
        state.node_steps("web1").iter().map(|s| s.context.to_string()).collect();
    assert_eq!(contexts, ["1/1", "2"]);
    assert_eq!(state.node_steps("web2").len(), 1);
    assert!(state.node_steps("db1").is_empty());
}

#[test]
fn node_sets_are_unioned() {
    let mut raw = raw_execution(5, &["web1"], vec![raw_node_step("1", &[("web2", "SUCCEEDED")])]);
    raw.all_nodes = vec!["db1".into()];
    let state = build_execution(raw).unwrap();
    let targets: Vec<&str> = state.workflow.target_nodes.iter().map(String::as_str).collect();
    assert_eq!(targets, ["web1", "web2"]);
    let all: Vec<&str> = state.all_nodes.iter().map(String::as_str).collect();
    assert_eq!(all, ["db1", "web1", "web2"]);
}

#[test]
fn unknown_status_token_is_rejected() {
    let raw = raw_execution(6, &[], vec![raw_leaf("1", "BOGUS")]);
    assert_eq!(build_execution(raw), Err(MalformedStateError::UnknownStatus("BOGUS".into())));
}

#[test]
fn unknown_node_status_is_rejected() {
    let raw = raw_execution(6, &["web1"], vec![raw_node_step("1", &[("web1", "MAYBE")])]);
    assert_eq!(build_execution(raw), Err(MalformedStateError::UnknownStatus("MAYBE".into())));
}

#[yare::parameterized(
    out_of_position = { "2", None },
    explicit_number = { "1", Some(3) },
)]
fn context_must_end_with_step_number(stepctx: &str, step_num: Option<u32>) {
    let mut step = raw_leaf(stepctx, "SUCCEEDED");
    step.step_num = step_num;
    let err = build_execution(raw_execution(7, &[], vec![step])).unwrap_err();
    assert!(matches!(err, MalformedStateError::ContextMismatch { .. }), "{:?}", err);
}

#[test]
fn explicit_step_number_overrides_position() {
    let mut step = raw_leaf("3", "SUCCEEDED");
    step.step_num = Some(3);
    let state = build_execution(raw_execution(7, &[], vec![step])).unwrap();
    assert_eq!(state.workflow.steps[0].state.step_num(), 3);
}

#[test]
fn nested_context_must_sit_under_its_parent() {
    let raw = raw_execution(8, &[], vec![raw_sub_workflow("1", vec![raw_leaf("2/1", "RUNNING")])]);
    assert_eq!(
        build_execution(raw),
        Err(MalformedStateError::ContextNotNested { stepctx: "2/1".into(), parent: "1".into() })
    );
}

#[test]
fn top_level_step_cannot_be_nested() {
    let raw = raw_execution(8, &[], vec![raw_leaf("1/1", "RUNNING")]);
    assert!(matches!(
        build_execution(raw),
        Err(MalformedStateError::ContextNotNested { parent, .. }) if parent == "the top level"
    ));
}

#[test]
fn node_state_must_share_step_context() {
    let mut step = raw_node_step("1", &[("web1", "RUNNING")]);
    if let Some(nodes) = step.node_states.as_mut() {
        nodes.values_mut().for_each(|n| n.stepctx = Some("2".into()));
    }
    let err = build_execution(raw_execution(9, &["web1"], vec![step])).unwrap_err();
    assert!(matches!(err, MalformedStateError::ContextMismatch { .. }), "{:?}", err);
}

#[test]
fn node_state_context_defaults_to_step() {
    let mut step = raw_node_step("1", &[("web1", "SUCCEEDED")]);
    if let Some(nodes) = step.node_states.as_mut() {
        nodes.values_mut().for_each(|n| n.stepctx = None);
    }
    let state = build_execution(raw_execution(9, &["web1"], vec![step])).unwrap();
    assert_eq!(state.node_steps("web1")[0].context, ctx("1"));
}

#[test]
fn leaf_without_status_is_rejected() {
    let mut step = raw_leaf("1", "RUNNING");
    step.execution_state = None;
    assert_eq!(
        build_execution(raw_execution(10, &[], vec![step])),
        Err(MalformedStateError::MissingStatus { subject: "step 1".into() })
    );
}

#[test]
fn empty_workflow_needs_a_reported_status() {
    assert_eq!(
        build_execution(raw_execution(11, &[], vec![])),
        Err(MalformedStateError::MissingStatus { subject: "execution 11".into() })
    );

    let mut raw = raw_execution(11, &[], vec![]);
    raw.workflow.execution_state = Some("SUCCEEDED".into());
    assert_eq!(build_execution(raw).unwrap().status(), ExecutionStatus::Succeeded);
}

#[test]
fn end_time_requires_settled_status() {
    let mut step = raw_leaf("1", "RUNNING");
    step.timing = ended();
    assert_eq!(
        build_execution(raw_execution(12, &[], vec![step])),
        Err(MalformedStateError::EndedWhilePending { what: "step 1".into(), status: "RUNNING".into() })
    );
}

#[test]
fn end_time_is_fine_for_mixed_outcomes() {
    let mut raw = raw_execution(
        12,
        &["web1", "web2"],
        vec![raw_node_step("1", &[("web1", "SUCCEEDED"), ("web2", "FAILED")])],
    );
    raw.workflow.timing = ended();
    assert_eq!(build_execution(raw).unwrap().status(), ExecutionStatus::NodeMixed);
}

#[test]
fn reported_settled_status_beats_pending_children() {
    let mut step = raw_node_step("1", &[("web1", "NOT_STARTED"), ("web2", "NOT_STARTED")]);
    step.execution_state = Some("ABORTED".into());
    let mut raw = raw_execution(13, &["web1", "web2"], vec![step]);
    raw.workflow.execution_state = Some("ABORTED".into());
    raw.workflow.timing = ended();

    let state = build_execution(raw).unwrap();
    assert_eq!(state.step(&ctx("1")).unwrap().status(), ExecutionStatus::Aborted);
    assert_eq!(state.status(), ExecutionStatus::Aborted);
}

#[test]
fn derived_status_beats_stale_report() {
    let mut step = raw_node_step("1", &[("web1", "SUCCEEDED"), ("web2", "SUCCEEDED")]);
    step.execution_state = Some("RUNNING".into());
    let state = build_execution(raw_execution(14, &["web1", "web2"], vec![step])).unwrap();
    assert_eq!(state.status(), ExecutionStatus::Succeeded);
}

#[test]
fn string_execution_ids_are_kept() {
    let mut raw = raw_execution(0, &[], vec![raw_leaf("1", "SUCCEEDED")]);
    raw.execution_id = crate::raw::RawId::Text("exec-42".into());
    assert_eq!(build_execution(raw).unwrap().execution_id, "exec-42");
}
