// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux reconcile` - runs one `Reconciler` sweep over every session in the
//! project and exits. There is no standing amux daemon (spec scope: only
//! the per-session `OutputProxy` is long-running); callers that want
//! continuous reconciliation invoke this on a cron or a wrapper loop.

use anyhow::Result;

use crate::bootstrap::ProjectContext;

pub async fn handle(ctx: &ProjectContext) -> Result<()> {
    let reconciler = ctx.reconciler();
    reconciler.sweep().await;
    Ok(())
}
