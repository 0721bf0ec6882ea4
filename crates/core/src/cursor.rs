// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental retrieval of an execution's output.
//!
//! An [`OutputCursor`] owns the offset into one execution's append-only log.
//! Each [`poll`](OutputCursor::poll) fetches what was appended since the
//! last one, so every line is delivered exactly once as long as polls are
//! sequential. A failed fetch or a rejected payload leaves the cursor where
//! it was, so the same poll can simply be retried.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{raw_context_within, StepContextId};
use crate::entry::{decode, OutputEntry};
use crate::error::{CursorError, MalformedStateError, SourceError};
use crate::id::ExecutionId;
use crate::raw::{RawFilter, RawOutput};
use crate::status::ExecutionStatus;

/// Restricts output to one node and/or one step subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogFilter {
    pub node: Option<String>,
    pub step: Option<StepContextId>,
}

impl LogFilter {
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn step(mut self, step: StepContextId) -> Self {
        self.step = Some(step);
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.node.is_none() && self.step.is_none()
    }

    /// An entry matches when its node is the filter's node and its step
    /// context lies within the filter's step. Entries missing a field the
    /// filter constrains never match.
    pub fn matches(&self, entry: &OutputEntry) -> bool {
        let node_ok = match &self.node {
            Some(node) => entry.node.as_deref() == Some(node.as_str()),
            None => true,
        };
        let step_ok = match &self.step {
            Some(step) => entry.step_context.as_deref().is_some_and(|raw| raw_context_within(raw, step)),
            None => true,
        };
        node_ok && step_ok
    }

    pub fn from_raw(raw: &RawFilter) -> Result<Self, MalformedStateError> {
        Ok(Self {
            node: raw.nodename.clone().filter(|n| !n.is_empty()),
            step: raw.stepctx.as_deref().filter(|s| !s.is_empty()).map(str::parse).transpose()?,
        })
    }

    pub fn to_raw(&self) -> RawFilter {
        RawFilter { nodename: self.node.clone(), stepctx: self.step.as_ref().map(ToString::to_string) }
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.node, &self.step) {
            (None, None) => f.write_str("none"),
            (Some(node), None) => write!(f, "node={}", node),
            (None, Some(step)) => write!(f, "step={}", step),
            (Some(node), Some(step)) => write!(f, "node={} step={}", node, step),
        }
    }
}

/// Two independent, monotone completion flags.
///
/// `exec_finished` may become true one poll before `log_finished` while the
/// last lines are flushed. Once the log has finished, the execution has too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// The log will not grow any further.
    pub log_finished: bool,
    /// The execution itself has ended.
    pub exec_finished: bool,
}

impl Completion {
    pub fn reported(log_finished: bool, exec_finished: bool) -> Self {
        Self { log_finished, exec_finished: exec_finished || log_finished }
    }

    /// Combine with a newer report; flags never revert.
    pub fn merge(self, newer: Completion) -> Self {
        Self::reported(
            self.log_finished || newer.log_finished,
            self.exec_finished || newer.exec_finished,
        )
    }
}

/// What a source is asked for on each poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRequest {
    pub execution_id: ExecutionId,
    pub offset: u64,
    pub filter: LogFilter,
}

/// Where raw output chunks come from (an HTTP client, a local file, a fake).
#[async_trait]
pub trait OutputSource: Send + Sync {
    /// Return everything appended at or after `request.offset`, and the
    /// offset just past it.
    async fn fetch(&self, request: &OutputRequest) -> Result<RawOutput, SourceError>;
}

/// Immutable result of one poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSnapshot {
    pub execution_id: ExecutionId,
    /// Next cursor position.
    pub offset: u64,
    pub entries: Vec<OutputEntry>,
    /// Nothing was appended since the previous poll.
    pub unmodified: bool,
    /// The execution has produced no output at all yet.
    pub empty: bool,
    pub completion: Completion,
    pub has_failed_nodes: bool,
    pub status: Option<ExecutionStatus>,
    pub last_modified: Option<DateTime<Utc>>,
    pub exec_duration: Option<Duration>,
    /// Advisory only.
    pub percent_loaded: Option<f64>,
    /// Advisory only.
    pub total_size: Option<u64>,
    pub filter: LogFilter,
}

impl OutputSnapshot {
    pub fn completed(&self) -> bool {
        self.completion.log_finished
    }

    pub fn exec_completed(&self) -> bool {
        self.completion.exec_finished
    }
}

/// Polling position in one execution's (optionally filtered) output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCursor {
    execution_id: ExecutionId,
    filter: LogFilter,
    offset: u64,
    completion: Completion,
    delivered: u64,
}

impl OutputCursor {
    /// A fresh, unfiltered cursor at offset 0.
    pub fn new(execution_id: impl Into<ExecutionId>) -> Self {
        Self {
            execution_id: execution_id.into(),
            filter: LogFilter::default(),
            offset: 0,
            completion: Completion::default(),
            delivered: 0,
        }
    }

    /// A fresh cursor for the same execution under `filter`.
    ///
    /// Offsets are only meaningful for the filter that produced them, so
    /// nothing but the execution id carries over.
    pub fn with_filter(self, filter: LogFilter) -> Self {
        Self { filter, ..Self::new(self.execution_id) }
    }

    /// Continue from an offset the caller checkpointed earlier.
    pub fn resume_at(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Entries delivered so far by this cursor.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Keep polling until the log itself has finished, even if the
    /// execution already reports completion.
    pub fn should_poll(&self) -> bool {
        !self.completion.log_finished
    }

    pub fn request(&self) -> OutputRequest {
        OutputRequest {
            execution_id: self.execution_id.clone(),
            offset: self.offset,
            filter: self.filter.clone(),
        }
    }

    /// Fetch and apply the next chunk.
    pub async fn poll<S>(&mut self, source: &S) -> Result<OutputSnapshot, CursorError>
    where
        S: OutputSource + ?Sized,
    {
        let raw = source.fetch(&self.request()).await?;
        self.advance(raw)
    }

    /// Validate a fetched chunk and move the cursor past it.
    ///
    /// Everything is checked before any field changes.
    pub fn advance(&mut self, raw: RawOutput) -> Result<OutputSnapshot, CursorError> {
        let found = ExecutionId::from(raw.id);
        if found != self.execution_id {
            return Err(CursorError::ExecutionMismatch {
                expected: self.execution_id.clone(),
                found,
            });
        }
        if let Some(echoed) = raw.filter.as_ref().map(LogFilter::from_raw).transpose()? {
            if echoed != self.filter {
                return Err(CursorError::FilterMismatch {
                    expected: self.filter.to_string(),
                    found: echoed.to_string(),
                });
            }
        }
        if raw.offset < self.offset {
            return Err(CursorError::OffsetRegressed { offset: self.offset, returned: raw.offset });
        }
        let status = ExecutionStatus::parse_opt(raw.exec_state.as_deref())?;

        let appended = raw.entries.len();
        let mut entries = Vec::with_capacity(appended);
        for record in raw.entries {
            let entry = decode(record)?;
            if self.filter.matches(&entry) {
                entries.push(entry);
            }
        }

        let unmodified = appended == 0 && (raw.unmodified || raw.offset == self.offset);
        let completion = self.completion.merge(Completion::reported(raw.completed, raw.exec_completed));
        if self.completion.log_finished {
            if !raw.completed {
                tracing::debug!(execution = %self.execution_id, "server dropped completed flag; keeping it");
            }
            if appended > 0 {
                tracing::warn!(
                    execution = %self.execution_id,
                    appended,
                    "log grew after it was reported complete"
                );
            }
        }
        let empty = raw.empty && self.delivered == 0 && entries.is_empty();

        self.offset = raw.offset;
        self.completion = completion;
        self.delivered += entries.len() as u64;

        tracing::trace!(
            execution = %self.execution_id,
            offset = self.offset,
            entries = entries.len(),
            completed = completion.log_finished,
            "output advanced"
        );

        Ok(OutputSnapshot {
            execution_id: self.execution_id.clone(),
            offset: raw.offset,
            entries,
            unmodified,
            empty,
            completion,
            has_failed_nodes: raw.has_failed_nodes,
            status,
            last_modified: raw
                .last_modified
                .and_then(|ms| i64::try_from(ms).ok())
                .and_then(DateTime::from_timestamp_millis),
            exec_duration: raw.exec_duration.map(Duration::from_millis),
            percent_loaded: raw.percent_loaded,
            total_size: raw.total_size,
            filter: self.filter.clone(),
        })
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
