// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! amux-proxy - detached output-proxy process.
//!
//! `SessionManager::start` re-execs this binary and never talks to it
//! except through the files and socket it writes. It is not meant to be
//! invoked by a human, so argv parsing here is hand-rolled rather than
//! pulled through `clap`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use amux_adapters::session::TmuxAdapter;
use amux_engine::proxy_runtime::{self, ProxyConfig};

/// `session-dir` is the sole required positional context: the session's
/// own name is its basename, and `run_id`/`status_path`/`log_path` are
/// derived from it unless explicitly overridden.
struct Args {
    session_dir: PathBuf,
    status_path: Option<PathBuf>,
    socket_path: PathBuf,
    log_path: Option<PathBuf>,
    ring_buffer_lines: usize,
    status_refresh_secs: u64,
    command: String,
}

fn parse_args() -> Result<Args, String> {
    let mut session_dir = None;
    let mut status_path = None;
    let mut socket_path = None;
    let mut log_path = None;
    let mut ring_buffer_lines = 1_000usize;
    let mut status_refresh_secs = 5u64;

    let mut args = std::env::args().skip(1);
    let mut command = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--session-dir" => session_dir = Some(PathBuf::from(next(&mut args, &arg)?)),
            "--status-path" => status_path = Some(PathBuf::from(next(&mut args, &arg)?)),
            "--socket-path" => socket_path = Some(PathBuf::from(next(&mut args, &arg)?)),
            "--log-path" => log_path = Some(PathBuf::from(next(&mut args, &arg)?)),
            "--ring-buffer-lines" => {
                ring_buffer_lines = next(&mut args, &arg)?
                    .parse()
                    .map_err(|e| format!("invalid --ring-buffer-lines: {e}"))?
            }
            "--status-refresh-secs" => {
                status_refresh_secs = next(&mut args, &arg)?
                    .parse()
                    .map_err(|e| format!("invalid --status-refresh-secs: {e}"))?
            }
            "--" => {
                command = Some(args.collect::<Vec<_>>().join(" "));
                break;
            }
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    Ok(Args {
        session_dir: session_dir.ok_or("missing --session-dir")?,
        status_path,
        socket_path: socket_path.ok_or("missing --socket-path")?,
        log_path,
        ring_buffer_lines,
        status_refresh_secs,
        command: command.ok_or("missing command after --")?,
    })
}

fn next(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} requires a value"))
}

#[tokio::main]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("amux-proxy: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let session_name = match args.session_dir.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            eprintln!("amux-proxy: --session-dir has no final path component");
            std::process::exit(2);
        }
    };
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("amux-proxy: cannot read working directory: {e}");
            std::process::exit(2);
        }
    };

    // `run_id` is ours to compute, not the caller's: reading the highest
    // existing run under `session_dir` is the only way to guarantee a
    // restart after a crash doesn't clobber the previous run's files.
    let run_id = proxy_runtime::next_run_id(&args.session_dir);
    let run_dir = args.session_dir.join(run_id.to_string());
    if let Err(e) = std::fs::create_dir_all(&run_dir) {
        eprintln!("amux-proxy: cannot create run directory {}: {e}", run_dir.display());
        std::process::exit(2);
    }
    let status_path = args.status_path.unwrap_or_else(|| run_dir.join("status.yaml"));
    let log_path = Some(args.log_path.unwrap_or_else(|| run_dir.join("console.log")));

    let env: Vec<(String, String)> = std::env::vars().collect();
    let cfg = ProxyConfig {
        session_name,
        cwd,
        command: args.command,
        env,
        run_id,
        status_path,
        socket_path: args.socket_path,
        log_path,
        ring_buffer_lines: args.ring_buffer_lines,
        status_refresh: Duration::from_secs(args.status_refresh_secs),
    };

    let terminal = Arc::new(TmuxAdapter::new());
    if let Err(e) = amux_engine::proxy_runtime::run(terminal, cfg).await {
        tracing::error!(error = %e, "proxy exited with error");
        std::process::exit(1);
    }
}
