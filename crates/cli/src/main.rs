// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xw: inspect execution state and tail execution output

mod color;
mod commands;
mod env;
mod exit_error;
mod output;
mod source;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "xw",
    version,
    about = "Inspect job execution state and tail execution output",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an execution's state tree
    State(commands::state::StateArgs),
    /// Print, and optionally follow, an execution's output
    Tail(commands::tail::TailArgs),
    /// Roll child statuses up into a parent status
    Aggregate(commands::aggregate::AggregateArgs),
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env::log_filter()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::State(args) => commands::state::handle(args, cli.output).await,
        Commands::Tail(args) => commands::tail::handle(args, cli.output).await,
        Commands::Aggregate(args) => commands::aggregate::handle(args, cli.output),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
