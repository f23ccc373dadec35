// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the per-session transition graph and the idle/working detection
//! inputs derived from proxy output.

use crate::error::storage_err;
use amux_core::{AmuxError, Clock, Result, SessionId, StateDocument, Status};
use amux_storage::StateStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub struct StateManager {
    store: StateStore,
    clock: Arc<dyn Clock>,
}

impl StateManager {
    pub fn new(store: StateStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn load(&self, session_id: &SessionId) -> Result<StateDocument> {
        self.store
            .load(session_id.as_str())
            .map_err(|e| storage_err(session_id.as_str(), e))
    }

    /// Applies `to` if and only if it is a legal successor of the
    /// currently persisted status; otherwise returns
    /// `AmuxError::InvalidTransition` without touching disk.
    pub fn transition(&self, session_id: &SessionId, to: Status) -> Result<StateDocument> {
        self.store
            .with_lock(session_id.as_str(), || {
                let mut doc = self.store.load(session_id.as_str())?;
                if !doc.status.can_transition_to(to) {
                    return Ok(Err(AmuxError::InvalidTransition {
                        from: doc.status,
                        to,
                    }));
                }
                doc.status = to;
                doc.status_changed_at = self.clock.now();
                if to == Status::Starting {
                    // Each Start gets its own sessions/<id>/<run>/ directory.
                    doc.run_count += 1;
                }
                self.store.save(session_id.as_str(), &doc)?;
                Ok(Ok(doc))
            })
            .map_err(|e| storage_err(session_id.as_str(), e))?
    }

    /// Records a chunk of newly observed output: updates `last_output_time`
    /// and the tail hash the reconciler diffs against to detect silence.
    /// Promotes `Running`/`Idle` to `Working` when new output actually
    /// changed the tail.
    pub fn record_output(&self, session_id: &SessionId, tail: &[u8]) -> Result<StateDocument> {
        let hash = format!("{:x}", Sha256::digest(tail));
        self.store
            .with_lock(session_id.as_str(), || {
                let mut doc = self.store.load(session_id.as_str())?;
                let now = self.clock.now();
                let changed = doc.last_output_hash.as_deref() != Some(hash.as_str());
                doc.last_output_hash = Some(hash.clone());
                doc.last_check_at = Some(now);
                if changed {
                    doc.last_output_time = Some(now);
                    if matches!(doc.status, Status::Running | Status::Idle)
                        && doc.status.can_transition_to(Status::Working)
                    {
                        doc.status = Status::Working;
                        doc.status_changed_at = now;
                    }
                }
                self.store.save(session_id.as_str(), &doc)?;
                Ok(doc)
            })
            .map_err(|e| storage_err(session_id.as_str(), e))
    }

    /// Records that the reconciler checked this session without observing
    /// new output, without attempting a status change itself (the
    /// idle/orphan decision is the reconciler's, not the state manager's).
    pub fn mark_checked(&self, session_id: &SessionId) -> Result<()> {
        self.store
            .with_lock(session_id.as_str(), || {
                let mut doc = self.store.load(session_id.as_str())?;
                doc.last_check_at = Some(self.clock.now());
                self.store.save(session_id.as_str(), &doc)
            })
            .map_err(|e| storage_err(session_id.as_str(), e))
    }
}

#[cfg(test)]
#[path = "state_manager_tests.rs"]
mod tests;
