// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::format::json::{history_from_json, history_to_json, HistoryJson};
use crate::history::History;

#[derive(Debug, Error)]
pub enum HistoryFileError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Temp file plus atomic rename, no fsync.
    #[default]
    BestEffort,
    /// Also syncs the file and (on unix) its directory.
    Durable,
}

/// A history document on disk.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
    durability: WriteDurability,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), durability: WriteDurability::default() }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_json(&self) -> Result<HistoryJson, HistoryFileError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| HistoryFileError::Io { path: self.path.clone(), source })?;
        serde_json::from_str(&raw)
            .map_err(|source| HistoryFileError::Json { path: self.path.clone(), source })
    }

    pub fn load(&self, config: HistoryConfig) -> Result<History, HistoryFileError> {
        let history = history_from_json(self.read_json()?, config)?;
        info!(
            path = %self.path.display(),
            nodes = history.store().len(),
            checkpoints = history.checkpoints().len(),
            "history loaded"
        );
        Ok(history)
    }

    pub fn save(&self, history: &History) -> Result<(), HistoryFileError> {
        let json = serde_json::to_string_pretty(&history_to_json(history))
            .map_err(|source| HistoryFileError::Json { path: self.path.clone(), source })?;
        write_atomic(&self.path, format!("{json}\n").as_bytes(), self.durability)?;
        info!(
            path = %self.path.display(),
            checkpoints = history.checkpoints().len(),
            "history saved"
        );
        Ok(())
    }
}

/// Move the finished temp file over `path`. The temp file is removed when the move fails.
fn replace_history(tmp_path: &Path, path: &Path) -> Result<(), HistoryFileError> {
    let mut moved = fs::rename(tmp_path, path);
    // Windows refuses to rename onto an existing file.
    if cfg!(windows) && path.exists() && moved.is_err() {
        let _ = fs::remove_file(path);
        moved = fs::rename(tmp_path, path);
    }
    moved.map_err(|source| {
        let _ = fs::remove_file(tmp_path);
        HistoryFileError::Io { path: path.to_path_buf(), source }
    })
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> HistoryFileError {
    let path = path.to_path_buf();
    move |source| HistoryFileError::Io { path, source }
}

fn write_atomic(path: &Path, contents: &[u8], durability: WriteDurability) -> Result<(), HistoryFileError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))
        .map_err(io_err(path))?;
    fs::create_dir_all(parent).map_err(io_err(parent))?;

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = parent.join(format!(".nbtrail.tmp.{}.{nanos}", file_name.to_string_lossy()));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(io_err(&tmp_path))?;
    file.write_all(contents).map_err(io_err(&tmp_path))?;
    if durability == WriteDurability::Durable {
        file.sync_all().map_err(io_err(&tmp_path))?;
    }
    drop(file);

    replace_history(&tmp_path, path)?;

    #[cfg(unix)]
    {
        if durability == WriteDurability::Durable {
            let dir = fs::File::open(parent).map_err(io_err(parent))?;
            dir.sync_all().map_err(io_err(parent))?;
        }
    }

    Ok(())
}
