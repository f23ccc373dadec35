// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! amux - thin CLI facade over the session-lifecycle engine. Argument
//! parsing and result rendering live here; every decision about session
//! state lives in `amux-engine`.

mod bootstrap;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use bootstrap::ProjectContext;
use commands::{reconcile, session};

#[derive(Parser)]
#[command(name = "amux", version, about = "Run AI-agent processes side by side in git-worktree-backed workspaces")]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session lifecycle (create/start/stop/remove/list/send/logs)
    Session(session::SessionArgs),
    /// Run one reconciler sweep over every known session
    Reconcile,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        let code = e
            .downcast_ref::<amux_core::AmuxError>()
            .map_or(1, |err| err.exit_code());
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let root = bootstrap::project_root(cli.directory)?;
    let ctx = ProjectContext::load(&root)?;

    match cli.command {
        Commands::Session(args) => session::handle(args.command, &ctx).await,
        Commands::Reconcile => reconcile::handle(&ctx).await,
    }
}
