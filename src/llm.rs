//! LLM provider abstraction
//!
//! One text-generation endpoint behind a trait, so the reply generator can be
//! tested against mocks.

mod error;
mod huggingface;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use huggingface::HuggingFaceService;
pub use types::*;

use crate::config::InferenceConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for text-generation providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Stand-in used when no API token is configured
pub struct UnconfiguredService {
    model_id: String,
}

impl UnconfiguredService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl LlmService for UnconfiguredService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Err(LlmError::auth("No API token configured (set API_TOKEN)"))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    prompt_chars = request.inputs.chars().count(),
                    response_chars = response.text.chars().count(),
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Build the configured service, wrapped with logging.
///
/// Without a token every request fails with an auth error, which the reply
/// generator turns into its fallback message.
pub fn build_service(config: &InferenceConfig) -> Arc<dyn LlmService> {
    let inner: Arc<dyn LlmService> = match &config.api_token {
        Some(token) => match HuggingFaceService::new(
            token.clone(),
            &config.base_url,
            &config.model,
            config.timeout,
        ) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create inference client");
                Arc::new(UnconfiguredService::new(config.model.clone()))
            }
        },
        None => Arc::new(UnconfiguredService::new(config.model.clone())),
    };
    Arc::new(LoggingService::new(inner))
}
