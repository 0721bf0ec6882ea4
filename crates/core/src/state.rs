// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed execution state: a tree of workflows, steps and per-node states.
//!
//! Values here are immutable snapshots. They are produced by
//! [`crate::build`], which validates raw records and runs the aggregator.

use std::collections::{BTreeMap, BTreeSet};
#[cfg(any(test, feature = "test-support"))]
use std::num::NonZeroU32;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, AggregateScope};
use crate::context::StepContextId;
use crate::id::ExecutionId;
use crate::raw::RawTiming;
use crate::status::ExecutionStatus;

/// Start, end and last-update times of a state record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub start_time: Option<DateTime<Utc>>,
    /// Only set once the status has settled.
    pub end_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Timing {
    /// Elapsed time, measured up to `now` while still running.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        let start = self.start_time?;
        Some(self.end_time.unwrap_or(now) - start)
    }
}

impl From<RawTiming> for Timing {
    fn from(raw: RawTiming) -> Self {
        Self { start_time: raw.start_time, end_time: raw.end_time, update_time: raw.update_time }
    }
}

/// Status of one step (or one step on one node) at a position in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContextState {
    pub context: StepContextId,
    #[serde(flatten)]
    pub timing: Timing,
    pub status: ExecutionStatus,
}

impl StepContextState {
    pub fn step_num(&self) -> u32 {
        self.context.step_num().get()
    }
}

crate::builder! {
    pub struct StepContextStateBuilder => StepContextState {
        set {
            context: StepContextId = StepContextId::root(NonZeroU32::MIN),
            timing: Timing = Timing::default(),
            status: ExecutionStatus = ExecutionStatus::NotStarted,
        }
    }
}

/// What a step runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "children", rename_all = "snake_case")]
pub enum StepKind {
    /// A plain command step with no children.
    Command,
    /// One state per target node.
    NodeFanout(BTreeMap<String, StepContextState>),
    /// A nested workflow owned by this step.
    SubWorkflow(Box<WorkflowState>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    #[serde(flatten)]
    pub state: StepContextState,
    pub kind: StepKind,
}

impl StepState {
    pub fn context(&self) -> &StepContextId {
        &self.state.context
    }

    pub fn status(&self) -> ExecutionStatus {
        self.state.status
    }

    pub fn is_node_step(&self) -> bool {
        matches!(self.kind, StepKind::NodeFanout(_))
    }

    pub fn node_states(&self) -> Option<&BTreeMap<String, StepContextState>> {
        match &self.kind {
            StepKind::NodeFanout(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn sub_workflow(&self) -> Option<&WorkflowState> {
        match &self.kind {
            StepKind::SubWorkflow(workflow) => Some(workflow),
            _ => None,
        }
    }
}

/// A workflow and the steps it owns, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(flatten)]
    pub timing: Timing,
    pub status: ExecutionStatus,
    pub step_count: u32,
    pub target_nodes: BTreeSet<String>,
    pub steps: Vec<StepState>,
}

impl WorkflowState {
    /// Look up a step anywhere in the tree by its context id.
    pub fn step(&self, context: &StepContextId) -> Option<&StepState> {
        let (last, parents) = context.segments().split_last()?;
        let mut workflow = self;
        for seg in parents {
            workflow = workflow.steps.iter().find(|s| s.context().step_num() == *seg)?.sub_workflow()?;
        }
        workflow.steps.iter().find(|s| s.context().step_num() == *last)
    }

    /// Every step in the tree, depth-first in execution order.
    pub fn iter_steps(&self) -> StepIter<'_> {
        StepIter { stack: self.steps.iter().rev().collect() }
    }

    /// (settled, total) over steps that do real work (not sub-workflow wrappers).
    pub fn progress(&self) -> (usize, usize) {
        self.iter_steps()
            .filter(|s| s.sub_workflow().is_none())
            .fold((0, 0), |(done, total), s| (done + usize::from(s.status().is_settled()), total + 1))
    }
}

/// Depth-first iterator over a workflow's steps.
pub struct StepIter<'a> {
    stack: Vec<&'a StepState>,
}

impl<'a> Iterator for StepIter<'a> {
    type Item = &'a StepState;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.stack.pop()?;
        if let Some(workflow) = step.sub_workflow() {
            self.stack.extend(workflow.steps.iter().rev());
        }
        Some(step)
    }
}

/// Full state snapshot of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub execution_id: ExecutionId,
    #[serde(flatten)]
    pub workflow: WorkflowState,
    /// Superset of `workflow.target_nodes`.
    pub all_nodes: BTreeSet<String>,
    /// Per node, its step states at every nesting level, in context order.
    pub node_states: BTreeMap<String, Vec<StepContextState>>,
}

impl ExecutionState {
    pub fn status(&self) -> ExecutionStatus {
        self.workflow.status
    }

    pub fn is_settled(&self) -> bool {
        self.workflow.status.is_settled()
    }

    pub fn step(&self, context: &StepContextId) -> Option<&StepState> {
        self.workflow.step(context)
    }

    pub fn node_steps(&self, node: &str) -> &[StepContextState] {
        self.node_states.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Overall status of one node across all the steps it ran.
    pub fn node_status(&self, node: &str) -> Option<ExecutionStatus> {
        let states = self.node_states.get(node)?;
        Some(aggregate(states.iter().map(|s| s.status), AggregateScope::StepSequence))
    }

    /// Nodes with at least one failed or aborted step.
    pub fn failed_nodes(&self) -> BTreeSet<&str> {
        self.node_states
            .iter()
            .filter(|(_, states)| {
                states.iter().any(|s| {
                    matches!(s.status, ExecutionStatus::Failed | ExecutionStatus::Aborted)
                })
            })
            .map(|(node, _)| node.as_str())
            .collect()
    }

    /// Steps currently running, innermost included.
    pub fn active_steps(&self) -> impl Iterator<Item = &StepState> {
        self.workflow.iter_steps().filter(|s| {
            matches!(s.status(), ExecutionStatus::Running | ExecutionStatus::RunningHandler)
        })
    }

    /// True if `self` is at least as recent as `previous` for the same execution.
    ///
    /// Pollers use this to drop snapshots that arrive out of order.
    pub fn supersedes(&self, previous: &ExecutionState) -> bool {
        if self.execution_id != previous.execution_id {
            return false;
        }
        match (self.workflow.timing.update_time, previous.workflow.timing.update_time) {
            (Some(now), Some(before)) => now >= before,
            (None, Some(_)) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
