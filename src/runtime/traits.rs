//! Trait abstractions for runtime I/O
//!
//! These traits let the runtime run against an in-memory store in tests.

use crate::registry::ChatHistory;
use crate::store::{HistoryFile, StoreResult};
use async_trait::async_trait;
use std::path::PathBuf;

/// Where the chat history lives between runs
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the saved history; missing storage is an empty history
    async fn load(&self) -> StoreResult<ChatHistory>;

    /// Replace the saved history
    async fn save(&self, history: &ChatHistory) -> StoreResult<()>;

    /// Set aside saved data that could not be parsed
    async fn quarantine(&self) -> StoreResult<PathBuf>;
}

#[async_trait]
impl HistoryStore for HistoryFile {
    async fn load(&self) -> StoreResult<ChatHistory> {
        HistoryFile::load(self)
    }

    async fn save(&self, history: &ChatHistory) -> StoreResult<()> {
        HistoryFile::save(self, history)
    }

    async fn quarantine(&self) -> StoreResult<PathBuf> {
        HistoryFile::quarantine(self)
    }
}
