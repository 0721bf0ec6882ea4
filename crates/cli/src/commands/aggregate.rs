// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xw aggregate` - Roll child statuses up into a parent status

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

use xw_core::{aggregate_tokens, AggregateScope, ExecutionStatus};

use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum Scope {
    /// Per-node states of one node step
    Node,
    /// Sibling steps of one workflow
    Step,
}

impl From<Scope> for AggregateScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Node => AggregateScope::NodeFanout,
            Scope::Step => AggregateScope::StepSequence,
        }
    }
}

#[derive(Args)]
pub struct AggregateArgs {
    /// What the child statuses belong to
    #[arg(long, value_enum, default_value_t = Scope::Step)]
    pub scope: Scope,

    /// Child status tokens (e.g. SUCCEEDED FAILED)
    pub statuses: Vec<String>,
}

#[derive(Serialize)]
struct Aggregated {
    scope: AggregateScope,
    children: usize,
    status: ExecutionStatus,
}

pub fn handle(args: AggregateArgs, format: OutputFormat) -> Result<()> {
    let scope = AggregateScope::from(args.scope);
    let status = aggregate_tokens(&args.statuses, scope)?;
    tracing::debug!(%scope, children = args.statuses.len(), %status, "aggregated");

    let result = Aggregated { scope, children: args.statuses.len(), status };
    format_or_json(format, &result, || {
        println!("{}", status.as_token());
        if args.statuses.is_empty() {
            eprintln!("{}", color::muted("no children given"));
        }
        Ok(())
    })
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
