// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session status and the transition graph that governs it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a session. Initial state is `Created`; terminal
/// states are `Stopped`, `Completed`, `Failed`, and `Orphaned`.
///
/// `Completed` and `Stopped` are kept distinct per an explicit Open Question
/// resolution (see DESIGN.md): `Completed` means the child process exited
/// with code 0 without an explicit `Stop` call, `Stopped` means an explicit
/// `Stop` was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Created,
    Starting,
    Running,
    Working,
    Idle,
    Stopping,
    Stopped,
    Completed,
    Failed,
    Orphaned,
}

impl Status {
    /// Terminal states never transition further; `Remove` only accepts
    /// sessions in one of these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Stopped | Status::Completed | Status::Failed | Status::Orphaned
        )
    }

    /// Whether `SendInput`/attach is meaningful right now.
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running | Status::Working | Status::Idle)
    }

    /// The fixed successors allowed by the transition graph.
    ///
    /// `Running`/`Working` carry an edge into `Orphaned` in addition to
    /// `Idle`, and `Orphaned` carries one outgoing edge into `Failed`: the
    /// reconciler must be able to carry any currently-supervised session
    /// straight through "orphaned, then failed" in one sweep even though
    /// `Orphaned` is otherwise a terminal status. See DESIGN.md for the
    /// full resolution of this tension.
    pub fn successors(self) -> &'static [Status] {
        use Status::*;
        match self {
            Created => &[Starting],
            Starting => &[Running, Failed],
            Running => &[Working, Idle, Stopping, Failed, Completed, Orphaned],
            Working => &[Idle, Stopping, Failed, Completed, Orphaned],
            Idle => &[Working, Stopping, Failed, Completed, Orphaned],
            Stopping => &[Stopped, Failed],
            Orphaned => &[Failed],
            Stopped | Completed | Failed => &[],
        }
    }

    /// Whether `self -> to` is a legal edge in the transition graph.
    pub fn can_transition_to(self, to: Status) -> bool {
        self.successors().contains(&to)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Created => "created",
            Status::Starting => "starting",
            Status::Running => "running",
            Status::Working => "working",
            Status::Idle => "idle",
            Status::Stopping => "stopping",
            Status::Stopped => "stopped",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Orphaned => "orphaned",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
