// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rolls child statuses up into a parent status.
//!
//! Children are either the per-node statuses of one node step
//! ([`AggregateScope::NodeFanout`]) or the steps of one workflow
//! ([`AggregateScope::StepSequence`]). The scope only matters when the
//! children finished with mixed outcomes, and then it alone picks the
//! token: a workflow over partially succeeded steps is `NodeMixed` even
//! when every step reports `NodePartialSucceeded`.

use serde::{Deserialize, Serialize};

use crate::error::MalformedStateError;
use crate::status::ExecutionStatus;

/// What the children being aggregated are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateScope {
    /// One step fanned out over target nodes.
    NodeFanout,
    /// Sibling steps of one workflow.
    StepSequence,
}

impl AggregateScope {
    fn mixed(self) -> ExecutionStatus {
        match self {
            AggregateScope::NodeFanout => ExecutionStatus::NodePartialSucceeded,
            AggregateScope::StepSequence => ExecutionStatus::NodeMixed,
        }
    }
}

crate::simple_display! {
    AggregateScope {
        NodeFanout => "node",
        StepSequence => "step",
    }
}

/// Derive a parent status from its children.
///
/// Total and order-independent. An empty input yields `NotStarted`.
pub fn aggregate<I>(children: I, scope: AggregateScope) -> ExecutionStatus
where
    I: IntoIterator<Item = ExecutionStatus>,
{
    let mut tally = Tally::default();
    for status in children {
        tally.add(status);
    }
    tally.resolve(scope)
}

/// Parse raw tokens and aggregate them. Unknown tokens fail.
pub fn aggregate_tokens<S: AsRef<str>>(
    tokens: &[S],
    scope: AggregateScope,
) -> Result<ExecutionStatus, MalformedStateError> {
    let statuses = tokens
        .iter()
        .map(|t| t.as_ref().parse::<ExecutionStatus>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(aggregate(statuses, scope))
}

#[derive(Default)]
struct Tally {
    pending: bool,
    started: bool,
    waiting: bool,
    success: bool,
    failed: bool,
    aborted: bool,
    mixed: bool,
}

impl Tally {
    fn add(&mut self, status: ExecutionStatus) {
        self.pending |= status.is_pending();
        self.started |= status.has_started();
        self.waiting |= status == ExecutionStatus::Waiting;
        self.success |= status == ExecutionStatus::Succeeded;
        self.failed |= status == ExecutionStatus::Failed;
        self.aborted |= status == ExecutionStatus::Aborted;
        self.mixed |= matches!(
            status,
            ExecutionStatus::NodePartialSucceeded | ExecutionStatus::NodeMixed
        );
    }

    fn resolve(&self, scope: AggregateScope) -> ExecutionStatus {
        if self.pending {
            return if self.started {
                ExecutionStatus::Running
            } else if self.waiting {
                ExecutionStatus::Waiting
            } else {
                ExecutionStatus::NotStarted
            };
        }

        let failure = self.failed || self.aborted;
        if self.mixed || (self.success && failure) {
            // The mixed token names the parent's level, not the child's
            return scope.mixed();
        }
        if self.aborted {
            ExecutionStatus::Aborted
        } else if self.failed {
            ExecutionStatus::Failed
        } else if self.success {
            ExecutionStatus::Succeeded
        } else {
            ExecutionStatus::NotStarted
        }
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
