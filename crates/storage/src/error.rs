// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document not found: {0}")]
    NotFound(std::path::PathBuf),
}

impl StorageError {
    /// Maps onto `amux_core::AmuxError::StateLoad` at the call site that
    /// knows the session id; this crate stays ignorant of `SessionId`.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StorageError::Json { .. } | StorageError::Yaml { .. })
    }
}
