//! HTTP API for TeenBuddy
//!
//! JSON endpoints for the chat actions, an SSE stream of state changes, and
//! the embedded browser page.

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::ChatRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ChatRuntime>,
}

impl AppState {
    pub fn new(runtime: ChatRuntime) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }
}
