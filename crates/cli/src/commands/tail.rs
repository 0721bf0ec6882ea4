// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xw tail` - Print, and optionally follow, an execution's output

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use xw_core::{
    ExecutionId, ExecutionStatus, LogFilter, LogLevel, OutputCursor, OutputEntry, OutputSnapshot,
    StepContextId,
};

use crate::color;
use crate::env;
use crate::exit_error::check_outcome;
use crate::output::{follow_output, write_entry, OutputFormat};
use crate::source::{load_state, FileOutputSource};

/// Execution id used when no state file names one.
const LOCAL_EXECUTION: &str = "local";

#[derive(Args)]
pub struct TailArgs {
    /// JSONL log, one raw entry per line
    pub log: PathBuf,

    /// Execution state file; completion and status are read from it
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Only show output from this node
    #[arg(long)]
    pub node: Option<String>,

    /// Only show output from this step and the steps nested under it (e.g. "2/1")
    #[arg(long)]
    pub step: Option<StepContextId>,

    /// Keep polling until the log has finished (like tail -f)
    #[arg(long, short)]
    pub follow: bool,

    /// Only show entries at least this severe
    #[arg(long)]
    pub level: Option<LogLevel>,

    /// Resume from a byte offset reported by an earlier run
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Exit with code 2 if the execution settled unsuccessfully
    #[arg(long)]
    pub fail: bool,
}

impl TailArgs {
    fn filter(&self) -> LogFilter {
        LogFilter { node: self.node.clone(), step: self.step.clone() }
    }
}

/// Entries at or above `level`, in log order.
fn visible(entries: &[OutputEntry], level: Option<LogLevel>) -> impl Iterator<Item = &OutputEntry> {
    entries.iter().filter(move |e| level.map_or(true, |l| e.level.is_at_least(l)))
}

fn print_entries(snapshot: &OutputSnapshot, level: Option<LogLevel>, format: OutputFormat) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for entry in visible(&snapshot.entries, level) {
        match format {
            OutputFormat::Text => write_entry(&mut out, entry)?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(entry)?)?,
        }
    }
    out.flush()?;
    Ok(())
}

pub async fn handle(args: TailArgs, format: OutputFormat) -> Result<()> {
    let execution_id = match &args.state {
        Some(path) => load_state(path).await?.execution_id,
        None => ExecutionId::new(LOCAL_EXECUTION),
    };
    let mut source = FileOutputSource::new(execution_id.clone(), &args.log);
    if let Some(path) = &args.state {
        source = source.with_state(path);
    }
    let mut cursor =
        OutputCursor::new(execution_id).with_filter(args.filter()).resume_at(args.offset);
    tracing::debug!(
        execution = %source.execution_id(),
        filter = %cursor.filter(),
        offset = args.offset,
        "tailing"
    );

    let mut status: Option<ExecutionStatus> = None;
    if args.follow {
        let finished = follow_output(&mut cursor, &source, env::log_poll_interval(), |snapshot| {
            status = snapshot.status.or(status);
            print_entries(snapshot, args.level, format)
        })
        .await?;
        if !finished {
            return Ok(());
        }
    } else {
        let mut snapshot = cursor.poll(&source).await?;
        status = snapshot.status;
        match format {
            OutputFormat::Text => {
                print_entries(&snapshot, args.level, format)?;
                if !snapshot.completed() {
                    eprintln!(
                        "{}",
                        color::muted(&format!("more output may follow; resume with --offset {}", snapshot.offset))
                    );
                }
            }
            OutputFormat::Json => {
                snapshot.entries = visible(&snapshot.entries, args.level).cloned().collect();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        }
    }

    check_outcome(status, args.fail)?;
    Ok(())
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
