// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;
use xw_core::{ExecutionState, OutputCursor, OutputEntry, OutputSnapshot, OutputSource, StepState};

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format-branch helper for commands that print one value.
///
/// Renders as JSON when `format` is `Json`, otherwise calls `text_fn`.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce() -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
            Ok(())
        }
        OutputFormat::Text => text_fn(),
    }
}

/// One log line: `time LEVEL node stepctx  message`.
pub fn write_entry(out: &mut dyn Write, entry: &OutputEntry) -> std::io::Result<()> {
    let node = entry.node.as_deref().unwrap_or("-");
    let step = entry.step_context.as_deref().unwrap_or("-");
    writeln!(
        out,
        "{} {} {} {}  {}",
        color::muted(&entry.relative_time),
        color::level(entry.level, 7),
        color::context(node),
        color::muted(step),
        entry.message
    )
}

/// Render the step tree with per-node states.
pub fn write_state(out: &mut dyn Write, state: &ExecutionState) -> std::io::Result<()> {
    let (done, total) = state.workflow.progress();
    writeln!(
        out,
        "{} {}  {}  ({}/{} steps)",
        color::header("Execution"),
        state.execution_id,
        color::status(state.status()),
        done,
        total
    )?;
    for step in &state.workflow.steps {
        write_step(out, step)?;
    }
    if !state.all_nodes.is_empty() {
        let nodes: Vec<String> = state
            .all_nodes
            .iter()
            .map(|node| match state.node_status(node) {
                Some(status) => format!("{} {}", node, color::status(status)),
                None => format!("{} {}", node, color::muted("idle")),
            })
            .collect();
        writeln!(out, "{} {}", color::header("Nodes:"), nodes.join(", "))?;
    }
    Ok(())
}

fn write_step(out: &mut dyn Write, step: &StepState) -> std::io::Result<()> {
    let indent = "  ".repeat(step.context().depth());
    writeln!(out, "{}{}  {}", indent, step.context(), color::status(step.status()))?;
    if let Some(nodes) = step.node_states() {
        for (node, node_state) in nodes {
            writeln!(out, "{}    {}  {}", indent, color::context(node), color::status(node_state.status))?;
        }
    }
    if let Some(workflow) = step.sub_workflow() {
        for child in &workflow.steps {
            write_step(out, child)?;
        }
    }
    Ok(())
}

/// Poll until the log has finished or Ctrl-C, handing every snapshot to `emit`.
///
/// Transient source failures are logged and retried at the same offset on
/// the next tick. Returns `false` when interrupted.
pub async fn follow_output<S, F>(
    cursor: &mut OutputCursor,
    source: &S,
    interval: Duration,
    mut emit: F,
) -> anyhow::Result<bool>
where
    S: OutputSource + ?Sized,
    F: FnMut(&OutputSnapshot) -> anyhow::Result<()>,
{
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut first = true;
    while cursor.should_poll() {
        if !first {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut ctrl_c => return Ok(false),
            }
        }
        first = false;

        match cursor.poll(source).await {
            Ok(snapshot) => emit(&snapshot)?,
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    execution = %cursor.execution_id(),
                    offset = cursor.offset(),
                    error = %e,
                    "poll failed, retrying"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
