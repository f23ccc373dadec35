// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-core: identifiers, the session status/transition graph, the
//! persisted data model, structured errors, and project configuration
//! shared by every other `amux-*` crate.

pub mod clock;
pub mod config;
pub mod env_vars;
pub mod error;
pub mod idgen;
pub mod ids;
pub mod info;
pub mod status;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{AgentDefaults, Config, ConfigError, ProjectLayout};
pub use env_vars::SessionEnvContext;
pub use error::{AmuxError, Result};
pub use idgen::{IdGen, SequentialIdGen, UuidIdGen};
pub use ids::{resolve, Identifier, ShortId, ShortIndex, SessionId, WorkspaceId};
pub use info::{SessionInfo, StateDocument, WorkspaceRecord};
pub use status::Status;
