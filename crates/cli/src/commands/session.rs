// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux session` - thin facade over `amux_engine::SessionManager`. Argument
//! parsing and JSON rendering live here; every decision about *what*
//! happens to a session lives in the engine crate.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;

use amux_core::Identifier;
use amux_engine::CreateOptions;

use crate::bootstrap::ProjectContext;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a session against an existing or newly-claimed workspace
    Create {
        /// Logical agent id (looked up in config.yaml's agent defaults)
        agent_id: String,
        /// Existing workspace to attach to (full id, short index, or
        /// name); omit to auto-create one
        #[arg(long)]
        workspace: Option<String>,
        /// Override the agent's default command
        #[arg(long)]
        command: Option<String>,
        /// Human-friendly name, unique among active sessions
        #[arg(long)]
        name: Option<String>,
        /// Environment variables, repeatable: --env KEY=VALUE
        #[arg(long = "env", value_parser = parse_key_value)]
        env: Vec<(String, String)>,
        /// Text to inject into the agent shortly after launch
        #[arg(long)]
        initial_prompt: Option<String>,
    },
    /// Start a created (or previously stopped) session's agent process
    Start {
        id: String,
    },
    /// Stop a running session
    Stop {
        id: String,
        /// Send SIGKILL immediately instead of SIGTERM-then-wait
        #[arg(long)]
        force: bool,
    },
    /// Remove a session in a terminal state
    Remove {
        id: String,
        /// Leave the workspace in place even if this was its last holder
        #[arg(long)]
        keep_workspace: bool,
    },
    /// List all sessions known to this project
    List,
    /// Send a line of input to a running session's agent
    Send {
        id: String,
        text: String,
    },
    /// Print (or follow) a session's captured output
    Logs {
        id: String,
        /// Stream new output as it arrives instead of printing once
        #[arg(long, short = 'f')]
        follow: bool,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

pub async fn handle(command: SessionCommand, ctx: &ProjectContext) -> Result<()> {
    let manager = ctx.session_manager();
    let cancel = CancellationToken::new();

    match command {
        SessionCommand::Create {
            agent_id,
            workspace,
            command,
            name,
            env,
            initial_prompt,
        } => {
            let workspace_id = match workspace {
                Some(raw) => Some(manager.resolve_workspace(&Identifier::parse(&raw))?),
                None => None,
            };
            let opts = CreateOptions {
                session_id: None,
                workspace_id,
                agent_id,
                command,
                environment: env.into_iter().collect::<BTreeMap<_, _>>(),
                name,
                description: None,
                initial_prompt,
                labels: BTreeMap::new(),
                agent_run_id: None,
            };
            let info = manager.create_session(opts, &cancel).await?;
            print_json(&info)
        }
        SessionCommand::Start { id } => {
            let info = manager.start(&Identifier::parse(&id), &cancel).await?;
            print_json(&info)
        }
        SessionCommand::Stop { id, force } => {
            let info = manager.stop(&Identifier::parse(&id), force, &cancel).await?;
            print_json(&info)
        }
        SessionCommand::Remove { id, keep_workspace } => {
            manager.remove(&Identifier::parse(&id), keep_workspace, &cancel).await?;
            println!("removed {id}");
            Ok(())
        }
        SessionCommand::List => {
            let sessions = manager.list_sessions()?;
            print_json(&sessions)
        }
        SessionCommand::Send { id, text } => {
            manager.send_input(&Identifier::parse(&id), &text).await?;
            Ok(())
        }
        SessionCommand::Logs { id, follow } => {
            match manager.logs(&Identifier::parse(&id), follow).await? {
                amux_engine::LogHandle::Snapshot(path) => crate::output::print_snapshot(&path).await,
                amux_engine::LogHandle::Live(stream) => crate::output::stream_socket(stream).await,
                amux_engine::LogHandle::FollowFile(path) => crate::output::tail_file(&path).await,
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
