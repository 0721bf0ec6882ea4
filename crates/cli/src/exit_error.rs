// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use xw_core::ExecutionStatus;

/// Exit code when `--fail` is given and the execution did not succeed.
pub const UNSUCCESSFUL: i32 = 2;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// The execution settled with anything other than success.
    pub fn unsuccessful(status: ExecutionStatus) -> Self {
        Self::new(UNSUCCESSFUL, format!("execution {}", status))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// With `fail` set, an execution that settled with anything but success is
/// an error. Pending or unknown outcomes pass.
pub fn check_outcome(status: Option<ExecutionStatus>, fail: bool) -> Result<(), ExitError> {
    match status {
        Some(s) if fail && s.is_settled() && s != ExecutionStatus::Succeeded => {
            Err(ExitError::unsuccessful(s))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
