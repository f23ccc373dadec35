// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{EventSink, HookError, HookEvent};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Records every emitted event for test assertions.
#[derive(Default)]
pub struct FakeEventSink {
    events: Mutex<Vec<HookEvent>>,
}

impl FakeEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventSink for FakeEventSink {
    async fn emit(&self, event: &HookEvent) -> Result<(), HookError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
