// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised where raw payloads become typed values.
//!
//! Aggregation over already-typed statuses is total and never appears here.

use thiserror::Error;

use crate::id::ExecutionId;

/// A raw state record could not be turned into the typed model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedStateError {
    #[error("unknown execution status `{0}`")]
    UnknownStatus(String),

    #[error("{subject} has no status and no children to derive one from")]
    MissingStatus { subject: String },

    #[error("invalid step context id `{0}`")]
    BadContextId(String),

    /// Last path segment disagrees with the step's position.
    #[error("step context id {stepctx} does not end with step number {step_num}")]
    ContextMismatch { stepctx: String, step_num: u32 },

    #[error("step context id {stepctx} is not nested under {parent}")]
    ContextNotNested { stepctx: String, parent: String },

    #[error("{what} has an end time but status {status} is still pending")]
    EndedWhilePending { what: String, status: String },
}

/// A raw log record could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedEntryError {
    #[error("unknown log level `{0}`")]
    UnknownLevel(String),

    #[error("invalid absolute time `{value}`: {reason}")]
    BadTimestamp { value: String, reason: String },
}

/// Failure reported by an [`OutputSource`](crate::cursor::OutputSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transient: the same request may succeed later.
    #[error("output source unavailable: {0}")]
    Unavailable(String),

    #[error("execution {0} not found")]
    NotFound(ExecutionId),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("undecodable payload: {0}")]
    Payload(String),
}

impl SourceError {
    /// Whether the caller should retry at the same offset.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_) | SourceError::Io(_))
    }
}

/// Errors from advancing an [`OutputCursor`](crate::cursor::OutputCursor).
///
/// Whatever the variant, the cursor is left exactly as it was before the call.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Entry(#[from] MalformedEntryError),

    #[error(transparent)]
    State(#[from] MalformedStateError),

    #[error("payload is for execution {found}, cursor tracks {expected}")]
    ExecutionMismatch { expected: ExecutionId, found: ExecutionId },

    #[error("payload was produced for filter {found}, cursor uses {expected}")]
    FilterMismatch { expected: String, found: String },

    #[error("returned offset {returned} is behind cursor offset {offset}")]
    OffsetRegressed { offset: u64, returned: u64 },
}

impl CursorError {
    /// Retry at the same offset (true) or abandon the session (false).
    pub fn is_retryable(&self) -> bool {
        match self {
            CursorError::Source(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
