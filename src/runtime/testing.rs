//! Mock implementations for testing
//!
//! These mocks enable runtime and API tests without real I/O.

use super::traits::HistoryStore;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::registry::ChatHistory;
use crate::store::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Each completion waits for one `notify_one` on `gate` before answering
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// In-memory History Store
// ============================================================================

/// What the next `load` returns
#[derive(Debug, Clone)]
pub enum InitialLoad {
    History(ChatHistory),
    Corrupt,
    Unreadable,
}

/// In-memory store that records every save
pub struct MemoryStore {
    initial: Mutex<InitialLoad>,
    saves: Mutex<Vec<ChatHistory>>,
    fail_saves: AtomicBool,
    quarantined: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_initial(InitialLoad::History(ChatHistory::default()))
    }

    pub fn with_initial(initial: InitialLoad) -> Self {
        Self {
            initial: Mutex::new(initial),
            saves: Mutex::new(Vec::new()),
            fail_saves: AtomicBool::new(false),
            quarantined: AtomicBool::new(false),
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saves(&self) -> Vec<ChatHistory> {
        self.saves.lock().unwrap().clone()
    }

    pub fn last_saved(&self) -> Option<ChatHistory> {
        self.saves.lock().unwrap().last().cloned()
    }

    pub fn was_quarantined(&self) -> bool {
        self.quarantined.load(Ordering::SeqCst)
    }

    fn io_error(message: &str) -> StoreError {
        StoreError::Io {
            path: PathBuf::from("memory"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, message.to_string()),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn load(&self) -> StoreResult<ChatHistory> {
        match self.initial.lock().unwrap().clone() {
            InitialLoad::History(history) => Ok(history),
            InitialLoad::Corrupt => Err(StoreError::Corrupt {
                path: PathBuf::from("memory"),
                source: serde_json::from_str::<ChatHistory>("{").unwrap_err(),
            }),
            InitialLoad::Unreadable => Err(Self::io_error("read denied")),
        }
    }

    async fn save(&self, history: &ChatHistory) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::io_error("disk full"));
        }
        self.saves.lock().unwrap().push(history.clone());
        Ok(())
    }

    async fn quarantine(&self) -> StoreResult<PathBuf> {
        self.quarantined.store(true, Ordering::SeqCst);
        *self.initial.lock().unwrap() = InitialLoad::History(ChatHistory::default());
        Ok(PathBuf::from("memory.corrupt"))
    }
}
