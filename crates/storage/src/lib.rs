// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-storage: on-disk persistence for the session lifecycle subsystem —
//! the `StateStore`, `SessionStore`, `IdMap`, and `WorkspaceSemaphore`.

pub mod atomic;
pub mod error;
pub mod idmap;
pub mod semaphore;
pub mod session_store;
pub mod state_store;
pub mod workspace_store;

pub use error::StorageError;
pub use idmap::IdMap;
pub use semaphore::{SemaphoreDocument, WorkspaceSemaphore};
pub use session_store::SessionStore;
pub use state_store::StateStore;
pub use workspace_store::WorkspaceRecordStore;
