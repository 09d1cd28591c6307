//! Persistence for the chat history
//!
//! The whole history is one JSON document at a fixed path. Every save
//! rewrites the document; there is no incremental log.

use crate::registry::ChatHistory;
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("History file I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("History file {} is not valid: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The history file on disk
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file; a missing file is an empty history.
    pub fn load(&self) -> StoreResult<ChatHistory> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ChatHistory::default()),
            Err(e) => return Err(self.io_error(e)),
        };

        // Bad UTF-8 is a parse error here, so it gets quarantined like any other
        serde_json::from_slice(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the file with the serialized history.
    ///
    /// Writes a sibling temp file and renames it over the target.
    pub fn save(&self, history: &ChatHistory) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_vec(history).map_err(|e| self.io_error(e.into()))?;
        let tmp_path = self.sibling("tmp");
        fs::write(&tmp_path, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Move an unreadable file out of the way so the next save doesn't
    /// overwrite it. Returns where it went.
    pub fn quarantine(&self) -> StoreResult<PathBuf> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let target = self.sibling(&format!("corrupt-{stamp}"));
        fs::rename(&self.path, &target).map_err(|e| self.io_error(e))?;
        Ok(target)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(format!(".{suffix}"));
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
