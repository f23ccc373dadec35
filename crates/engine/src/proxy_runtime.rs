// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties the `proxy` building blocks together into one running process:
//! launches the agent through a `TerminalAdapter`, mirrors its pane output
//! into the ring buffer/log/socket pipeline, and refreshes a status file.
//! This is the body of the `amux-proxy` binary; it is a library module so
//! tests can drive a run in-process against a `FakeTerminalAdapter`.

use crate::proxy::{ClientRegistry, LineAccumulator, RingBuffer, BROADCAST_DEADLINE};
use amux_adapters::TerminalAdapter;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex as AsyncMutex;

/// Status heartbeat written to `<run-dir>/status.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub run_id: u64,
    pub pid: u32,
    pub status: ProxyRunState,
    /// The terminal-multiplexer session name actually used, as returned by
    /// `TerminalAdapter::create_session` (which may rename it, e.g. a
    /// `tmux` prefix). Callers must use this value, not the name they
    /// requested, for subsequent `send_keys`/`kill_session` calls.
    pub terminal_session: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyRunState {
    Running,
    Exited,
}

/// Everything the proxy needs to launch and supervise one run.
pub struct ProxyConfig {
    pub session_name: String,
    pub cwd: PathBuf,
    pub command: String,
    pub env: Vec<(String, String)>,
    pub run_id: u64,
    pub status_path: PathBuf,
    pub socket_path: PathBuf,
    pub log_path: Option<PathBuf>,
    pub ring_buffer_lines: usize,
    pub status_refresh: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to launch agent: {0}")]
    Launch(#[from] amux_adapters::TerminalError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Runs one proxy session to completion: launches the agent, mirrors its
/// pane output, serves connected socket clients, and writes the status
/// heartbeat, returning once the underlying terminal session is gone.
pub async fn run(
    terminal: Arc<dyn TerminalAdapter>,
    cfg: ProxyConfig,
) -> Result<(), ProxyError> {
    let started_at = Utc::now();
    let pid = std::process::id();

    let terminal_session = terminal
        .create_session(&cfg.session_name, &cfg.cwd, &cfg.command, &cfg.env)
        .await?;

    // Mirrors the pane into a growing file rather than relying on
    // `capture_pane`'s bounded scrollback window, which stops growing once
    // a session has produced more than its window's worth of lines.
    let pipe_path = cfg
        .status_path
        .parent()
        .map(|p| p.join("pipe.raw"))
        .unwrap_or_else(|| PathBuf::from("pipe.raw"));
    if let Some(parent) = pipe_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::File::create(&pipe_path);
    terminal.pipe_output(&terminal_session, &pipe_path).await?;

    write_status(
        &cfg.status_path,
        &ProxyStatus {
            run_id: cfg.run_id,
            pid,
            status: ProxyRunState::Running,
            terminal_session: terminal_session.clone(),
            exit_code: None,
            started_at,
            ended_at: None,
        },
    )?;

    if let Some(parent) = cfg.socket_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::remove_file(&cfg.socket_path);
    let listener = UnixListener::bind(&cfg.socket_path)?;

    let ring = Arc::new(parking_lot::Mutex::new(RingBuffer::new(cfg.ring_buffer_lines)));
    let registry = Arc::new(AsyncMutex::new(ClientRegistry::new()));

    let accept_ring = ring.clone();
    let accept_registry = registry.clone();
    let accept_task = tokio::spawn(async move {
        accept_loop(listener, accept_ring, accept_registry).await;
    });

    let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut int = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    let mut accumulator = LineAccumulator::new();
    let mut poll = tokio::time::interval(Duration::from_millis(200));
    let mut refresh = tokio::time::interval(cfg.status_refresh);
    let mut pipe_offset: u64 = 0;

    let exit_code = loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Ok(fresh) = read_new_bytes(&pipe_path, &mut pipe_offset).await {
                    if !fresh.is_empty() {
                        emit(&fresh, &mut accumulator, &ring, &registry, cfg.log_path.as_deref()).await;
                    }
                }
                if !terminal.has_session(&terminal_session).await.unwrap_or(false) {
                    break None;
                }
            }
            _ = refresh.tick() => {
                let _ = write_status(&cfg.status_path, &ProxyStatus {
                    run_id: cfg.run_id,
                    pid,
                    status: ProxyRunState::Running,
                    terminal_session: terminal_session.clone(),
                    exit_code: None,
                    started_at,
                    ended_at: None,
                });
            }
            _ = term.recv() => {
                let _ = terminal.kill_session(&terminal_session).await;
                break Some(-1);
            }
            _ = int.recv() => {
                let _ = terminal.kill_session(&terminal_session).await;
                break Some(-1);
            }
        }
    };

    // One last read catches anything written between the final tick and
    // the child exiting or being signaled.
    if let Ok(fresh) = read_new_bytes(&pipe_path, &mut pipe_offset).await {
        if !fresh.is_empty() {
            emit(&fresh, &mut accumulator, &ring, &registry, cfg.log_path.as_deref()).await;
        }
    }
    if let Some(tail) = accumulator.flush() {
        emit_line(tail, &ring, &registry).await;
    }

    write_status(
        &cfg.status_path,
        &ProxyStatus {
            run_id: cfg.run_id,
            pid,
            status: ProxyRunState::Exited,
            terminal_session: terminal_session.clone(),
            exit_code,
            started_at,
            ended_at: Some(Utc::now()),
        },
    )?;

    accept_task.abort();
    Ok(())
}

async fn emit(
    bytes: &[u8],
    accumulator: &mut LineAccumulator,
    ring: &Arc<parking_lot::Mutex<RingBuffer>>,
    registry: &Arc<AsyncMutex<ClientRegistry>>,
    log_path: Option<&Path>,
) {
    if let Some(path) = log_path {
        if let Ok(mut file) = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
        {
            let _ = file.write_all(bytes).await;
        }
    }
    for line in accumulator.feed(bytes) {
        emit_line(line, ring, registry).await;
    }
}

async fn emit_line(
    line: Bytes,
    ring: &Arc<parking_lot::Mutex<RingBuffer>>,
    registry: &Arc<AsyncMutex<ClientRegistry>>,
) {
    ring.lock().push(line.clone());
    let dead = registry.lock().await.broadcast(line).await;
    if !dead.is_empty() {
        let mut guard = registry.lock().await;
        for id in dead {
            guard.remove(id);
        }
    }
}

async fn accept_loop(
    listener: UnixListener,
    ring: Arc<parking_lot::Mutex<RingBuffer>>,
    registry: Arc<AsyncMutex<ClientRegistry>>,
) {
    loop {
        let (stream, _addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "proxy socket accept failed");
                continue;
            }
        };
        let snapshot = ring.lock().snapshot();
        let (id, rx) = registry.lock().await.register(64);
        let registry = registry.clone();
        tokio::spawn(async move {
            serve_client(stream, snapshot, rx).await;
            registry.lock().await.remove(id);
        });
    }
}

async fn serve_client(mut stream: UnixStream, replay: Vec<Bytes>, mut rx: tokio::sync::mpsc::Receiver<Bytes>) {
    for line in replay {
        if tokio::time::timeout(BROADCAST_DEADLINE, stream.write_all(&line))
            .await
            .is_err()
        {
            return;
        }
    }
    let mut discard = [0u8; 256];
    loop {
        tokio::select! {
            line = rx.recv() => {
                match line {
                    Some(line) => {
                        if stream.write_all(&line).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                }
            }
            n = stream.read(&mut discard) => {
                match n {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
            }
        }
    }
}

fn write_status(path: &Path, status: &ProxyStatus) -> io::Result<()> {
    amux_storage::atomic::atomic_write_yaml(path, status)
}

/// Reads whatever bytes have been appended to `path` since `offset`,
/// advancing `offset` to the new end of file. A missing file (the pipe
/// hasn't been created yet) is treated as "nothing new" rather than an
/// error.
async fn read_new_bytes(path: &Path, offset: &mut u64) -> io::Result<Vec<u8>> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let len = file.metadata().await?.len();
    if len <= *offset {
        return Ok(Vec::new());
    }
    file.seek(io::SeekFrom::Start(*offset)).await?;
    let mut buf = Vec::with_capacity((len - *offset) as usize);
    file.read_to_end(&mut buf).await?;
    *offset = len;
    Ok(buf)
}

/// Scans `session_dir` for existing `<run-id>/status.yaml` files and
/// returns one past the highest run id found, or `1` if the session has
/// never been started before. This is the proxy's own source of truth for
/// `run_id`; callers must not compute it independently and hand it in.
pub fn next_run_id(session_dir: &Path) -> u64 {
    let mut max = 0u64;
    let Ok(entries) = std::fs::read_dir(session_dir) else {
        return 1;
    };
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Ok(id) = name.parse::<u64>() else {
            continue;
        };
        if entry.path().join("status.yaml").exists() && id > max {
            max = id;
        }
    }
    max + 1
}

#[cfg(test)]
#[path = "proxy_runtime_tests.rs"]
mod tests;
