// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xw-core: execution state aggregation and output tailing for xwatch

pub mod macros;

pub mod aggregate;
pub mod build;
pub mod context;
pub mod cursor;
pub mod entry;
pub mod error;
pub mod id;
pub mod raw;
pub mod state;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregate::{aggregate, aggregate_tokens, AggregateScope};
pub use build::{build_execution, build_step, build_workflow};
pub use context::StepContextId;
pub use cursor::{
    Completion, LogFilter, OutputCursor, OutputRequest, OutputSnapshot, OutputSource,
};
#[cfg(any(test, feature = "test-support"))]
pub use entry::OutputEntryBuilder;
pub use entry::{decode, encode, sort_by_time, LogLevel, OutputEntry};
pub use error::{CursorError, MalformedEntryError, MalformedStateError, SourceError};
pub use id::ExecutionId;
pub use raw::{RawExecutionState, RawLogEntry, RawOutput};
#[cfg(any(test, feature = "test-support"))]
pub use state::StepContextStateBuilder;
pub use state::{ExecutionState, StepContextState, StepKind, StepState, Timing, WorkflowState};
pub use status::ExecutionStatus;
