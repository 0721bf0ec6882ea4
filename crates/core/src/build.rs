// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns raw state records into the typed state tree.
//!
//! Every subtree's status is derived from its children with
//! [`aggregate`] as soon as the subtree is built. A reported status token is
//! always validated; it only overrides the derived one when the server says
//! the subtree has settled while its children still look pending (for
//! example a workflow aborted before any step started).

use std::collections::BTreeMap;

use crate::aggregate::{aggregate, AggregateScope};
use crate::context::StepContextId;
use crate::error::MalformedStateError;
use crate::id::ExecutionId;
use crate::raw::{RawExecutionState, RawNodeState, RawStepState, RawWorkflowState};
use crate::state::{ExecutionState, StepContextState, StepKind, StepState, Timing, WorkflowState};
use crate::status::ExecutionStatus;

/// Build a full execution snapshot.
pub fn build_execution(raw: RawExecutionState) -> Result<ExecutionState, MalformedStateError> {
    let execution_id = ExecutionId::from(raw.execution_id);
    let label = format!("execution {}", execution_id);
    let mut workflow = build_workflow(raw.workflow, None, &label)?;

    let mut node_states: BTreeMap<String, Vec<StepContextState>> = BTreeMap::new();
    for step in workflow.iter_steps() {
        for (node, state) in step.node_states().into_iter().flatten() {
            node_states.entry(node.clone()).or_default().push(state.clone());
        }
    }
    for states in node_states.values_mut() {
        states.sort_by(|a, b| a.context.cmp(&b.context));
    }

    workflow.target_nodes.extend(node_states.keys().cloned());
    let mut all_nodes = workflow.target_nodes.clone();
    all_nodes.extend(raw.all_nodes);

    tracing::debug!(
        execution = %execution_id,
        status = %workflow.status,
        nodes = all_nodes.len(),
        "built execution state"
    );

    Ok(ExecutionState { execution_id, workflow, all_nodes, node_states })
}

/// Build a workflow owned by `parent` (or the top-level workflow when `None`).
pub fn build_workflow(
    raw: RawWorkflowState,
    parent: Option<&StepContextId>,
    label: &str,
) -> Result<WorkflowState, MalformedStateError> {
    let steps = raw
        .steps
        .into_iter()
        .zip(1u32..)
        .map(|(step, position)| build_step(step, parent, position))
        .collect::<Result<Vec<_>, _>>()?;

    let reported = ExecutionStatus::parse_opt(raw.execution_state.as_deref())?;
    let derived = (!steps.is_empty())
        .then(|| aggregate(steps.iter().map(StepState::status), AggregateScope::StepSequence));
    let status = resolve(reported, derived, label)?;

    let timing = Timing::from(raw.timing);
    check_timing(&timing, status, label)?;

    let step_count = raw.step_count.unwrap_or(steps.len() as u32);
    Ok(WorkflowState {
        timing,
        status,
        step_count,
        target_nodes: raw.target_nodes.into_iter().collect(),
        steps,
    })
}

/// Build one step at 1-indexed `position` within its parent workflow.
pub fn build_step(
    raw: RawStepState,
    parent: Option<&StepContextId>,
    position: u32,
) -> Result<StepState, MalformedStateError> {
    let context: StepContextId = raw.stepctx.parse()?;
    context.check_step_num(raw.step_num.unwrap_or(position))?;
    if context.parent().as_ref() != parent {
        return Err(MalformedStateError::ContextNotNested {
            stepctx: context.to_string(),
            parent: parent.map_or_else(|| "the top level".to_string(), ToString::to_string),
        });
    }

    let label = format!("step {}", context);
    let reported = ExecutionStatus::parse_opt(raw.execution_state.as_deref())?;

    let (kind, derived) = if let Some(workflow) = raw.workflow {
        if raw.node_states.is_some() {
            tracing::debug!(stepctx = %context, "step has both a workflow and node states; using the workflow");
        }
        let workflow = build_workflow(*workflow, Some(&context), &label)?;
        let status = (!workflow.steps.is_empty()).then_some(workflow.status);
        (StepKind::SubWorkflow(Box::new(workflow)), status)
    } else if raw.node_step || raw.node_states.is_some() {
        let nodes = raw
            .node_states
            .unwrap_or_default()
            .into_iter()
            .map(|(node, state)| {
                let state = build_node_state(&node, state, &context)?;
                Ok((node, state))
            })
            .collect::<Result<BTreeMap<_, _>, MalformedStateError>>()?;
        let status = (!nodes.is_empty())
            .then(|| aggregate(nodes.values().map(|s| s.status), AggregateScope::NodeFanout));
        (StepKind::NodeFanout(nodes), status)
    } else {
        (StepKind::Command, None)
    };

    let status = resolve(reported, derived, &label)?;
    let timing = Timing::from(raw.timing);
    check_timing(&timing, status, &label)?;

    Ok(StepState { state: StepContextState { context, timing, status }, kind })
}

fn build_node_state(
    node: &str,
    raw: RawNodeState,
    step: &StepContextId,
) -> Result<StepContextState, MalformedStateError> {
    let context = match raw.stepctx {
        Some(ctx) => ctx.parse::<StepContextId>()?,
        None => step.clone(),
    };
    context.check_step_num(step.step_num().get())?;
    if context != *step {
        return Err(MalformedStateError::ContextNotNested {
            stepctx: context.to_string(),
            parent: step.parent().map_or_else(|| "the top level".to_string(), |p| p.to_string()),
        });
    }

    let label = format!("step {}@{}", context, node);
    let status = match raw.execution_state {
        Some(token) => token.parse()?,
        None => return Err(MalformedStateError::MissingStatus { subject: label }),
    };
    let timing = Timing::from(raw.timing);
    check_timing(&timing, status, &label)?;
    Ok(StepContextState { context, timing, status })
}

fn resolve(
    reported: Option<ExecutionStatus>,
    derived: Option<ExecutionStatus>,
    label: &str,
) -> Result<ExecutionStatus, MalformedStateError> {
    let status = match (reported, derived) {
        (Some(r), Some(d)) if r.is_settled() && d.is_pending() => r,
        (_, Some(d)) => d,
        (Some(r), None) => r,
        (None, None) => {
            return Err(MalformedStateError::MissingStatus { subject: label.to_string() })
        }
    };
    if let Some(r) = reported.filter(|r| *r != status) {
        tracing::debug!(subject = label, reported = %r, derived = %status, "reported status differs from children");
    }
    Ok(status)
}

fn check_timing(
    timing: &Timing,
    status: ExecutionStatus,
    label: &str,
) -> Result<(), MalformedStateError> {
    if timing.end_time.is_some() && status.is_pending() {
        return Err(MalformedStateError::EndedWhilePending {
            what: label.to_string(),
            status: status.as_token().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
