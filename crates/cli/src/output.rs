// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering for `amux session logs`: printing a snapshot, streaming a live
//! proxy socket, or tailing a file when the proxy is gone but its log
//! survives.

use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Print a run's `console.log` once, in full.
pub async fn print_snapshot(path: &Path) -> Result<()> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            print!("{content}");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("no log entries found at {}", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Copy bytes from a live proxy socket to stdout until the proxy
/// disconnects or the user interrupts.
pub async fn stream_socket(mut stream: tokio::net::UnixStream) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut buf = [0u8; 4096];
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            n = stream.read(&mut buf) => {
                match n {
                    Ok(0) | Err(_) => return Ok(()),
                    Ok(n) => {
                        stdout.write_all(&buf[..n]).await?;
                        stdout.flush().await?;
                    }
                }
            }
            _ = &mut ctrl_c => return Ok(()),
        }
    }
}

/// Tail a file, printing new lines as they appear, until ctrl-c. Used when
/// the proxy's socket is unavailable but its log file still exists.
pub async fn tail_file(path: &Path) -> Result<()> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};
    use std::io::{BufRead, BufReader};

    let file = std::fs::File::open(path)
        .map_err(|_| anyhow::anyhow!("log file not found: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    while reader.read_line(&mut line)? > 0 {
        print!("{line}");
        line.clear();
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let path_buf = path.to_path_buf();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_)) {
                let _ = tx.blocking_send(());
            }
        }
    })?;
    let watch_dir = path_buf.parent().unwrap_or(&path_buf);
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            print!("{line}");
            line.clear();
        }

        tokio::select! {
            _ = rx.recv() => {}
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}
