// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::raw_context_within;
use crate::cursor::{OutputRequest, OutputSource};
use crate::error::SourceError;
use crate::id::ExecutionId;
use crate::raw::{
    RawExecutionState, RawId, RawLogEntry, RawNodeState, RawOutput, RawStepState,
    RawWorkflowState,
};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for statuses, levels and entries.
pub mod strategies {
    use chrono::DateTime;
    use proptest::collection::SizeRange;
    use proptest::prelude::*;

    use crate::aggregate::AggregateScope;
    use crate::entry::{LogLevel, OutputEntry};
    use crate::status::ExecutionStatus;

    pub fn arb_status() -> impl Strategy<Value = ExecutionStatus> {
        proptest::sample::select(ExecutionStatus::ALL.to_vec())
    }

    pub fn arb_pending_status() -> impl Strategy<Value = ExecutionStatus> {
        prop_oneof![
            Just(ExecutionStatus::Waiting),
            Just(ExecutionStatus::Running),
            Just(ExecutionStatus::RunningHandler),
            Just(ExecutionStatus::NotStarted),
        ]
    }

    pub fn arb_statuses(len: impl Into<SizeRange>) -> impl Strategy<Value = Vec<ExecutionStatus>> {
        proptest::collection::vec(arb_status(), len)
    }

    pub fn arb_scope() -> impl Strategy<Value = AggregateScope> {
        prop_oneof![Just(AggregateScope::NodeFanout), Just(AggregateScope::StepSequence)]
    }

    pub fn arb_level() -> impl Strategy<Value = LogLevel> {
        proptest::sample::select(LogLevel::ALL.to_vec())
    }

    pub fn arb_output_entry() -> impl Strategy<Value = OutputEntry> {
        let time = (0i64..4_102_444_800, 0u32..1_000_000_000)
            .prop_filter_map("valid timestamp", |(s, n)| DateTime::from_timestamp(s, n));
        (
            "[0-9:]{0,8}",
            proptest::option::of(time),
            arb_level(),
            ".*",
            proptest::option::of("[a-z]{1,8}"),
            proptest::option::of("[a-z ]{1,12}"),
            proptest::option::of("[a-z0-9-]{1,10}"),
            proptest::option::of(prop_oneof![Just("log".to_string()), Just("stepbegin".to_string())]),
            proptest::option::of("[1-9](/[1-9]){0,3}e?"),
            proptest::collection::btree_map("[a-z-]{1,8}", ".{0,8}", 0..3),
        )
            .prop_map(
                |(relative_time, absolute_time, level, message, user, command, node, entry_type, step_context, metadata)| {
                    OutputEntry {
                        relative_time,
                        absolute_time,
                        level,
                        message,
                        user,
                        command,
                        node,
                        entry_type,
                        step_context,
                        metadata,
                    }
                },
            )
    }
}

// ── Raw record factories ────────────────────────────────────────────────

/// A command step with a reported status.
pub fn raw_leaf(stepctx: &str, status: &str) -> RawStepState {
    RawStepState {
        stepctx: stepctx.to_string(),
        execution_state: Some(status.to_string()),
        ..Default::default()
    }
}

/// A node step with one `(node, status)` pair per target node.
pub fn raw_node_step(stepctx: &str, nodes: &[(&str, &str)]) -> RawStepState {
    let node_states = nodes
        .iter()
        .map(|(node, status)| {
            let state = RawNodeState {
                stepctx: Some(stepctx.to_string()),
                execution_state: Some(status.to_string()),
                ..Default::default()
            };
            (node.to_string(), state)
        })
        .collect::<BTreeMap<_, _>>();
    RawStepState {
        stepctx: stepctx.to_string(),
        node_step: true,
        node_states: Some(node_states),
        ..Default::default()
    }
}

/// A step running a nested workflow.
pub fn raw_sub_workflow(stepctx: &str, steps: Vec<RawStepState>) -> RawStepState {
    RawStepState {
        stepctx: stepctx.to_string(),
        workflow: Some(Box::new(RawWorkflowState { steps, ..Default::default() })),
        ..Default::default()
    }
}

pub fn raw_execution(id: u64, targets: &[&str], steps: Vec<RawStepState>) -> RawExecutionState {
    RawExecutionState {
        execution_id: RawId::Number(id),
        all_nodes: Vec::new(),
        workflow: RawWorkflowState {
            target_nodes: targets.iter().map(|t| t.to_string()).collect(),
            steps,
            ..Default::default()
        },
    }
}

/// A log line `n` on `node` within step `stepctx`.
pub fn raw_line(n: usize, node: &str, stepctx: &str) -> RawLogEntry {
    RawLogEntry {
        time: format!("00:00:{:02}", n % 60),
        level: "NORMAL".to_string(),
        log: format!("line {}", n),
        node: Some(node.to_string()),
        entry_type: Some("log".to_string()),
        stepctx: Some(stepctx.to_string()),
        ..Default::default()
    }
}

// ── In-memory output source ─────────────────────────────────────────────

#[derive(Default)]
struct MemoryLogState {
    entries: Vec<RawLogEntry>,
    chunk: usize,
    exec_finished: bool,
    log_finished: bool,
    failures: usize,
    fetches: usize,
    has_failed_nodes: bool,
}

/// An append-only log served from memory. Offsets count entries.
///
/// Clones share the same log, so a test can keep appending while a cursor
/// polls it.
#[derive(Clone)]
pub struct MemoryLog {
    execution_id: ExecutionId,
    state: Arc<Mutex<MemoryLogState>>,
}

impl MemoryLog {
    pub fn new(execution_id: impl Into<ExecutionId>) -> Self {
        Self { execution_id: execution_id.into(), state: Arc::default() }
    }

    pub fn append(&self, entry: RawLogEntry) {
        self.state.lock().entries.push(entry);
    }

    /// Append `count` lines numbered from the current length.
    pub fn append_lines(&self, count: usize) {
        let mut state = self.state.lock();
        let start = state.entries.len();
        state.entries.extend((start..start + count).map(|n| raw_line(n, "web1", "1")));
    }

    /// Serve at most `chunk` entries per fetch (0 = no limit).
    pub fn set_chunk(&self, chunk: usize) {
        self.state.lock().chunk = chunk;
    }

    /// The execution has ended but its last lines may still be flushing.
    pub fn finish_execution(&self) {
        self.state.lock().exec_finished = true;
    }

    /// No more lines will be appended.
    pub fn finish_log(&self) {
        let mut state = self.state.lock();
        state.exec_finished = true;
        state.log_finished = true;
    }

    pub fn set_failed_nodes(&self, failed: bool) {
        self.state.lock().has_failed_nodes = failed;
    }

    /// Fail the next `count` fetches as unavailable.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures = count;
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().fetches
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OutputSource for MemoryLog {
    async fn fetch(&self, request: &OutputRequest) -> Result<RawOutput, SourceError> {
        let mut state = self.state.lock();
        state.fetches += 1;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(SourceError::Unavailable("injected failure".to_string()));
        }
        if request.execution_id != self.execution_id {
            return Err(SourceError::NotFound(request.execution_id.clone()));
        }

        let len = state.entries.len();
        let start = usize::try_from(request.offset).unwrap_or(usize::MAX).min(len);
        let end = match state.chunk {
            0 => len,
            chunk => (start + chunk).min(len),
        };
        let filter = &request.filter;
        let entries: Vec<RawLogEntry> = state.entries[start..end]
            .iter()
            .filter(|e| filter.node.as_ref().map_or(true, |n| e.node.as_ref() == Some(n)))
            .filter(|e| {
                filter.step.as_ref().map_or(true, |s| {
                    e.stepctx.as_deref().is_some_and(|raw| raw_context_within(raw, s))
                })
            })
            .cloned()
            .collect();

        Ok(RawOutput {
            id: RawId::from(&self.execution_id),
            offset: end as u64,
            completed: state.log_finished && end == len,
            exec_completed: state.exec_finished,
            has_failed_nodes: state.has_failed_nodes,
            exec_state: None,
            last_modified: None,
            exec_duration: None,
            percent_loaded: (len > 0).then(|| end as f64 * 100.0 / len as f64),
            total_size: Some(len as u64),
            unmodified: start == end,
            empty: len == 0,
            filter: (!filter.is_unfiltered()).then(|| filter.to_raw()),
            entries,
        })
    }
}
