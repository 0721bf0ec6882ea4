// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution status shared by executions, workflows, steps and nodes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MalformedStateError;

/// Status of an execution, workflow, step or per-node step.
///
/// `NodePartialSucceeded` and `NodeMixed` never come from a single leaf;
/// they are produced by [`aggregate`](crate::aggregate::aggregate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Waiting,
    Running,
    /// An error handler is running after a step failure.
    RunningHandler,
    Succeeded,
    Failed,
    Aborted,
    /// Some nodes of one node step succeeded, others did not.
    NodePartialSucceeded,
    /// Different steps of one workflow ended with different outcomes.
    NodeMixed,
    NotStarted,
}

impl ExecutionStatus {
    pub const ALL: [ExecutionStatus; 9] = [
        ExecutionStatus::Waiting,
        ExecutionStatus::Running,
        ExecutionStatus::RunningHandler,
        ExecutionStatus::Succeeded,
        ExecutionStatus::Failed,
        ExecutionStatus::Aborted,
        ExecutionStatus::NodePartialSucceeded,
        ExecutionStatus::NodeMixed,
        ExecutionStatus::NotStarted,
    ];

    /// Succeeded, failed or aborted.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded | ExecutionStatus::Failed | ExecutionStatus::Aborted
        )
    }

    /// Still waiting, running, or not started.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Waiting
                | ExecutionStatus::Running
                | ExecutionStatus::RunningHandler
                | ExecutionStatus::NotStarted
        )
    }

    /// Finished: terminal, or a synthesized mixed outcome.
    pub fn is_settled(self) -> bool {
        !self.is_pending()
    }

    /// Work has begun (running, or already settled).
    pub fn has_started(self) -> bool {
        !matches!(self, ExecutionStatus::Waiting | ExecutionStatus::NotStarted)
    }

    /// Settled with at least one successful branch.
    pub fn has_success(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded
                | ExecutionStatus::NodePartialSucceeded
                | ExecutionStatus::NodeMixed
        )
    }

    /// Settled with at least one failed or aborted branch.
    pub fn has_failure(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Failed
                | ExecutionStatus::Aborted
                | ExecutionStatus::NodePartialSucceeded
                | ExecutionStatus::NodeMixed
        )
    }

    /// Wire token, e.g. `NODE_PARTIAL_SUCCEEDED`.
    pub fn as_token(self) -> &'static str {
        match self {
            ExecutionStatus::Waiting => "WAITING",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::RunningHandler => "RUNNING_HANDLER",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::NodePartialSucceeded => "NODE_PARTIAL_SUCCEEDED",
            ExecutionStatus::NodeMixed => "NODE_MIXED",
            ExecutionStatus::NotStarted => "NOT_STARTED",
        }
    }

    /// Parse an optional raw token; `None` stays `None`.
    pub fn parse_opt(token: Option<&str>) -> Result<Option<Self>, MalformedStateError> {
        token.map(str::parse).transpose()
    }
}

/// Accepts the state endpoint's `RUNNING` and the output endpoint's
/// `running` alike. Unknown tokens are an error, never a default.
impl FromStr for ExecutionStatus {
    type Err = MalformedStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        ExecutionStatus::ALL
            .into_iter()
            .find(|status| status.as_token().eq_ignore_ascii_case(token))
            .ok_or_else(|| MalformedStateError::UnknownStatus(s.to_string()))
    }
}

crate::simple_display! {
    ExecutionStatus {
        Waiting => "waiting",
        Running => "running",
        RunningHandler => "running handler",
        Succeeded => "succeeded",
        Failed => "failed",
        Aborted => "aborted",
        NodePartialSucceeded => "partially succeeded",
        NodeMixed => "mixed",
        NotStarted => "not started",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
