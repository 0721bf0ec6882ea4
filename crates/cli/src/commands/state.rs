// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xw state` - Show an execution's state tree

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use xw_core::{ExecutionState, ExecutionStatus, StepContextState};

use crate::color;
use crate::exit_error::check_outcome;
use crate::output::{format_or_json, write_state, OutputFormat};
use crate::source::load_state;

#[derive(Args)]
pub struct StateArgs {
    /// Execution state JSON file
    pub file: PathBuf,

    /// Only show the steps this node ran
    #[arg(long)]
    pub node: Option<String>,

    /// Exit with code 2 if the execution settled unsuccessfully
    #[arg(long)]
    pub fail: bool,
}

#[derive(Serialize)]
struct NodeView<'a> {
    node: &'a str,
    status: Option<ExecutionStatus>,
    steps: &'a [StepContextState],
}

pub async fn handle(args: StateArgs, format: OutputFormat) -> Result<()> {
    let state = load_state(&args.file).await?;
    match args.node.as_deref() {
        Some(node) => print_node(&state, node, format)?,
        None => format_or_json(format, &state, || {
            let mut out = std::io::stdout().lock();
            write_state(&mut out, &state)?;
            Ok(())
        })?,
    }
    check_outcome(Some(state.status()), args.fail)?;
    Ok(())
}

fn print_node(state: &ExecutionState, node: &str, format: OutputFormat) -> Result<()> {
    if !state.all_nodes.contains(node) {
        anyhow::bail!("node {} is not part of execution {}", node, state.execution_id);
    }
    let view = NodeView { node, status: state.node_status(node), steps: state.node_steps(node) };
    format_or_json(format, &view, || {
        let mut out = std::io::stdout().lock();
        let status = view.status.map_or_else(|| color::muted("idle"), color::status);
        writeln!(out, "{} {}  {}", color::header("Node"), node, status)?;
        for step in view.steps {
            writeln!(out, "  {}  {}", step.context, color::status(step.status))?;
        }
        Ok(())
    })
}
