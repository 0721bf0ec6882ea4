// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::time::Duration;

/// Delay between polls while following output (default 1s, `XW_LOG_POLL_MS`).
pub fn log_poll_interval() -> Duration {
    std::env::var("XW_LOG_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(1))
}

/// Diagnostics filter directive for stderr logging (default `warn`, `XW_LOG`).
pub fn log_filter() -> String {
    std::env::var("XW_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "warn".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
