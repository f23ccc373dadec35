// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared atomic write-then-rename helper used by every store in this
//! crate, and the advisory directory lock that guards compound
//! read-modify-write operations across processes.

use fs2::FileExt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialize `value` to JSON and write it to `path` via write-to-temp,
/// fsync, rename-over-target — a crash mid-write never corrupts `path`.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Same contract as `atomic_write_json` but for YAML-formatted files
/// (`id-mappings.yaml`, `status.yaml`, `config.yaml`).
pub fn atomic_write_yaml<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = tmp_path_for(path);
    let raw = serde_yaml::to_string(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(raw.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// An advisory exclusive lock on a `.lock` file sitting next to the data
/// file it guards. Held for the duration of a compound read-modify-write;
/// dropping it releases the lock.
pub struct DirLock {
    _file: File,
}

impl DirLock {
    /// Acquire an exclusive lock on `<dir>/.lock`, creating the directory
    /// and the lock file if needed. Blocks the calling thread until the
    /// lock is available.
    pub fn acquire(dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let lock_path = dir.join(".lock");
        let file = File::options()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
