//! CLI help output specs
//!
//! Verify help text displays for all commands.

use crate::prelude::*;

#[test]
fn xw_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn xw_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("state")
        .stdout_has("tail")
        .stdout_has("aggregate");
}

#[test]
fn xw_tail_help_shows_filters() {
    cli()
        .args(&["tail", "--help"])
        .passes()
        .stdout_has("--node")
        .stdout_has("--step")
        .stdout_has("--follow");
}

#[test]
fn xw_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_command_fails() {
    cli().args(&["frobnicate"]).fails().stderr_has("frobnicate");
}
