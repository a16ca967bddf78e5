// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! `substrate` — thin CLI surface over the execution substrate.
//!
//! Every command opens the `agentos` component database directly; there is
//! no daemon to talk to. Exit codes: `0` success, non-zero on user error or
//! failure, with a human message on stderr.

mod color;
mod commands;
mod exit_error;
mod output;

use clap::Parser;
use exit_error::ExitError;
use substrate_core::{Clock, SystemClock};
use substrate_storage::Database;

#[derive(Parser)]
#[command(name = "substrate", version, styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
 /// Project and repo registration
    Project(commands::project::ProjectArgs),
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}

fn run() -> Result<(), ExitError> {
    let cli = Cli::parse();
    let db = Database::open("agentos").map_err(|e| ExitError::new(2, format!("could not open database: {e}")))?;
    let now = (SystemClock.epoch_ms() / 1000) as i64;

    match cli.command {
        Command::Project(args) => commands::project::handle(&db, args, now),
    }
}
