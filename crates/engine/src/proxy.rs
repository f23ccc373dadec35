// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OutputProxy internals: the ring buffer, per-stream partial
//! line accumulator, and client broadcast registry shared by the
//! `amux-proxy` binary and by tests that drive the proxy in-process.

use bytes::Bytes;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

/// Per-client broadcast write deadline.
pub const BROADCAST_DEADLINE: Duration = Duration::from_millis(100);

/// Bounded fixed-capacity queue of whole output lines, replayed to newly
/// connecting clients before they receive live broadcasts.
pub struct RingBuffer {
    lines: VecDeque<Bytes>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn push(&mut self, line: Bytes) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// A consistent snapshot for replay to a new subscriber; taken under
    /// the same lock as concurrent pushes so no line is skipped or
    /// duplicated relative to the live broadcast that follows.
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Splits a raw byte stream into whole lines, holding back a trailing
/// partial line until either a newline arrives or `flush` is called at
/// EOF.
#[derive(Default)]
pub struct LineAccumulator {
    pending: Vec<u8>,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(Bytes::from(line));
        }
        lines
    }

    pub fn flush(&mut self) -> Option<Bytes> {
        if self.pending.is_empty() {
            None
        } else {
            Some(Bytes::from(std::mem::take(&mut self.pending)))
        }
    }
}

/// One connected socket client's outbound queue. Bounded so a slow client
/// cannot make the proxy buffer unboundedly.
pub struct Client {
    id: u64,
    tx: mpsc::Sender<Bytes>,
}

impl Client {
    /// Sends `line` with a write deadline; a timeout or closed channel
    /// means the client is gone and should be dropped from the registry.
    pub async fn send(&self, line: Bytes) -> bool {
        matches!(
            tokio::time::timeout(BROADCAST_DEADLINE, self.tx.send(line)).await,
            Ok(Ok(()))
        )
    }
}

/// Registry of connected clients; the accepter task adds, broadcast tasks
/// remove on error.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Vec<Client>,
    next_id: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new client and returns its outbound queue's receiver
    /// half so the connection task can forward bytes to the socket.
    pub fn register(&mut self, capacity: usize) -> (u64, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        let id = self.next_id;
        self.next_id += 1;
        self.clients.push(Client { id, tx });
        (id, rx)
    }

    pub fn remove(&mut self, id: u64) {
        self.clients.retain(|c| c.id != id);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Broadcasts one line to every client, returning the ids of clients
    /// that failed to keep up and must be dropped.
    pub async fn broadcast(&self, line: Bytes) -> Vec<u64> {
        let mut dead = Vec::new();
        for client in &self.clients {
            if !client.send(line.clone()).await {
                dead.push(client.id);
            }
        }
        dead
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
